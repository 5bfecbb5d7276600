use crate::config::{load_config, Config};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::{build_diagram, parse_document};
use crate::render::{render_diagram, write_png};
use crate::text_metrics::{find_system_font, FontBook, FontFace};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "dgr", version, about = "Box-tree diagram renderer (JSON in, PNG out)")]
pub struct Args {
    /// Input diagram (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output PNG file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Config JSON file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Default label font (TrueType/OpenType). Falls back to a system sans-serif face.
    #[arg(long = "font")]
    pub font: Option<PathBuf>,

    /// Extra font selectable through `labelFont`, as KEY=PATH (repeatable)
    #[arg(long = "namedFont", value_parser = parse_named_font)]
    pub named_fonts: Vec<(String, PathBuf)>,

    /// Write final bindings and routes as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

fn parse_named_font(value: &str) -> std::result::Result<(String, PathBuf), String> {
    let (key, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=PATH, got `{value}`"))?;
    if key.is_empty() || path.is_empty() {
        return Err(format!("expected KEY=PATH, got `{value}`"));
    }
    Ok((key.to_string(), PathBuf::from(path)))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;

    let (input, base_dir) = read_input(args.input.as_deref())?;
    let doc = parse_document(&input)?;
    let mut diagram = build_diagram(&doc, &base_dir, &config.theme)?;
    let fonts = load_fonts(args.font.as_deref(), &args.named_fonts)?;

    compute_layout(&mut diagram, &config.layout)?;
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &diagram, &config.layout)
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }
    render_to_file(&mut diagram, &fonts, &config, &args.output)
}

fn render_to_file(
    diagram: &mut crate::layout::Diagram,
    fonts: &FontBook,
    config: &Config,
    output: &Path,
) -> Result<()> {
    let image = render_diagram(diagram, fonts, config)?;
    write_png(&image, output).with_context(|| format!("failed to write {}", output.display()))?;
    info!("wrote {}x{} image to {}", image.width(), image.height(), output.display());
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, PathBuf)> {
    if let Some(path) = path.filter(|path| *path != Path::new("-")) {
        let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok((content, base_dir));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, PathBuf::from(".")))
}

fn load_fonts(default: Option<&Path>, named: &[(String, PathBuf)]) -> Result<FontBook> {
    let default_face = match default {
        Some(path) => Some(FontFace::open(path)?),
        None => {
            let face = find_system_font("sans-serif");
            if face.is_none() {
                warn!("no system sans-serif font found; pass --font to draw labels");
            }
            face
        }
    };
    let mut book = FontBook::new(default_face);
    for (key, path) in named {
        let face = FontFace::open(path).map_err(|err| anyhow!("font `{key}`: {err}"))?;
        book.insert(key.clone(), face);
    }
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_font_arguments() {
        let (key, path) = parse_named_font("mono=/fonts/mono.ttf").unwrap();
        assert_eq!(key, "mono");
        assert_eq!(path, PathBuf::from("/fonts/mono.ttf"));
        assert!(parse_named_font("mono").is_err());
        assert!(parse_named_font("=x.ttf").is_err());
    }

    #[test]
    fn args_parse_long_and_short_flags() {
        let args = Args::try_parse_from([
            "dgr",
            "-i",
            "in.json",
            "-o",
            "out.png",
            "--configFile",
            "cfg.json",
            "--namedFont",
            "title=bold.ttf",
            "--dumpLayout",
            "layout.json",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("in.json")));
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
        assert_eq!(args.named_fonts, vec![("title".to_string(), PathBuf::from("bold.ttf"))]);
        assert_eq!(args.dump_layout, Some(PathBuf::from("layout.json")));
        assert!(Args::try_parse_from(["dgr", "-i", "in.json"]).is_err());
    }

    #[test]
    fn explicit_unreadable_font_is_fatal() {
        assert!(load_fonts(Some(Path::new("/nonexistent/font.ttf")), &[]).is_err());
    }
}
