use crate::theme::{Rgba, Theme};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Distance an orthogonal route leaves its anchor before turning.
    pub clearance: i32,
    /// Extra offset of the detour segment around both shapes.
    pub detour: i32,
    /// Minor/major offset ratio at which `auto` picks a corner anchor.
    pub intercardinal_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            clearance: 20,
            detour: 50,
            intercardinal_ratio: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Half-width of node frames in pixels.
    pub frame_width: i32,
    pub leaf_font_size: f32,
    pub group_font_size: f32,
    pub link_label_font_size: f32,
    /// Gap between an icon and its label.
    pub label_gap: f32,
    pub max_canvas_side: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_width: 2,
            leaf_font_size: 24.0,
            group_font_size: 30.0,
            link_label_font_size: 20.0,
            label_gap: 4.0,
            max_canvas_side: 16384,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    background: Option<Rgba>,
    label_color: Option<Rgba>,
    line_color: Option<Rgba>,
    border_color: Option<Rgba>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutSection {
    clearance: Option<i32>,
    detour: Option<i32>,
    intercardinal_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderSection {
    frame_width: Option<i32>,
    leaf_font_size: Option<f32>,
    group_font_size: Option<f32>,
    link_label_font_size: Option<f32>,
    label_gap: Option<f32>,
    max_canvas_side: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutSection>,
    render: Option<RenderSection>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = match theme_name {
            "classic" | "default" => Theme::classic(),
            "dark" => Theme::dark(),
            other => return Err(anyhow::anyhow!("unknown theme: {other}")),
        };
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.border_color {
            config.theme.border_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.clearance {
            config.layout.clearance = v.max(1);
        }
        if let Some(v) = layout.detour {
            config.layout.detour = v.max(1);
        }
        if let Some(v) = layout.intercardinal_ratio {
            config.layout.intercardinal_ratio = v.clamp(0.0, 1.0);
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.frame_width {
            config.render.frame_width = v.max(1);
        }
        if let Some(v) = render.leaf_font_size {
            config.render.leaf_font_size = v;
        }
        if let Some(v) = render.group_font_size {
            config.render.group_font_size = v;
        }
        if let Some(v) = render.link_label_font_size {
            config.render.link_label_font_size = v;
        }
        if let Some(v) = render.label_gap {
            config.render.label_gap = v;
        }
        if let Some(v) = render.max_canvas_side {
            config.render.max_canvas_side = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_rendering() {
        let config = Config::default();
        assert_eq!(config.layout.clearance, 20);
        assert_eq!(config.layout.detour, 50);
        assert_eq!(config.render.frame_width, 2);
        assert_eq!(config.render.leaf_font_size, 24.0);
        assert_eq!(config.render.group_font_size, 30.0);
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.theme.background, Rgba::WHITE);
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse_config(
            r##"{
                "theme": "dark",
                "themeVariables": { "lineColor": "#FF000080" },
                "layout": { "clearance": 30, "intercardinalRatio": 2.0 },
                "render": { "groupFontSize": 28 }
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.background, Theme::dark().background);
        assert_eq!(config.theme.line_color, Rgba::new(255, 0, 0, 128));
        assert_eq!(config.layout.clearance, 30);
        assert_eq!(config.layout.detour, 50);
        assert_eq!(config.layout.intercardinal_ratio, 1.0);
        assert_eq!(config.render.group_font_size, 28.0);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse_config(r#"{ "theme": "neon" }"#).is_err());
        assert!(parse_config(r#"{ "themeVariables": { "lineColor": "blue" } }"#).is_err());
    }
}
