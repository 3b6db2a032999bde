use crate::config::RenderConfig;
use crate::ir::{Direction, EdgePolarity, NodeKind};
use crate::layout::{EdgeLayout, NodeLayout, QuestLayout};
use crate::theme::Theme;
use crate::zones::{zone_by_id_prefix, zone_color};
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

const TITLE_CHARS_PER_LINE: usize = 28;
const TITLE_MAX_LINES: usize = 3;

pub fn render_svg(layout: &QuestLayout, theme: &Theme, config: &RenderConfig) -> String {
    let pad = config.padding;
    let width = (layout.bounds.width() + pad * 2.0).max(200.0);
    let height = (layout.bounds.height() + pad * 2.0).max(200.0);
    let offset = (pad - layout.bounds.min_x, pad - layout.bounds.min_y);

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.2} {height:.2}\">"
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    );

    svg.push_str("<defs>");
    for (id, color) in [
        ("arrow-positive", &theme.positive_edge_color),
        ("arrow-negative", &theme.negative_edge_color),
    ] {
        let _ = write!(
            svg,
            "<marker id=\"{id}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/></marker>"
        );
    }
    svg.push_str("</defs>");

    let _ = write!(
        svg,
        "<g transform=\"translate({:.2} {:.2})\">",
        offset.0, offset.1
    );

    for edge in &layout.edges {
        svg.push_str(&edge_svg(edge, layout, theme));
    }
    for node in layout.ordered_nodes() {
        svg.push_str(&node_svg(node, theme));
    }

    svg.push_str("</g></svg>");
    svg
}

fn edge_svg(edge: &EdgeLayout, layout: &QuestLayout, theme: &Theme) -> String {
    let d = curve_path(&edge.points, layout.direction);
    if d.is_empty() {
        return String::new();
    }
    let dimmed = [&edge.from, &edge.to]
        .iter()
        .any(|id| layout.nodes.get(id.as_str()).is_some_and(|node| node.dimmed));
    let opacity = if dimmed { theme.dimmed_opacity } else { 1.0 };
    match edge.polarity {
        EdgePolarity::Positive => format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" opacity=\"{opacity:.2}\" marker-end=\"url(#arrow-positive)\"/>",
            theme.positive_edge_color
        ),
        EdgePolarity::Negative => format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\" stroke-dasharray=\"6 4\" opacity=\"{opacity:.2}\" marker-end=\"url(#arrow-negative)\"/>",
            theme.negative_edge_color
        ),
    }
}

/// Cubic curve between the two endpoints, bending along the flow axis.
fn curve_path(points: &[(f32, f32)], direction: Direction) -> String {
    match points {
        [] => String::new(),
        [(x0, y0), (x1, y1)] => {
            let (c0, c1) = match direction {
                Direction::LeftRight => {
                    let bend = ((x1 - x0).abs() / 2.0).max(24.0);
                    ((x0 + bend, *y0), (x1 - bend, *y1))
                }
                Direction::TopBottom => {
                    let bend = ((y1 - y0).abs() / 2.0).max(24.0);
                    ((*x0, y0 + bend), (*x1, y1 - bend))
                }
            };
            format!(
                "M {x0:.2} {y0:.2} C {:.2} {:.2}, {:.2} {:.2}, {x1:.2} {y1:.2}",
                c0.0, c0.1, c1.0, c1.1
            )
        }
        [first, rest @ ..] => {
            let mut d = format!("M {:.2} {:.2}", first.0, first.1);
            for point in rest {
                let _ = write!(d, " L {:.2} {:.2}", point.0, point.1);
            }
            d
        }
    }
}

fn node_svg(node: &NodeLayout, theme: &Theme) -> String {
    let mut out = String::new();
    if node.dimmed {
        let _ = write!(out, "<g opacity=\"{:.2}\">", theme.dimmed_opacity);
    } else {
        out.push_str("<g>");
    }

    let (fill, stroke, stroke_width) = match node.kind {
        NodeKind::LevelGate { .. } => (theme.gate_fill.as_str(), theme.gate_border.as_str(), 2.0),
        NodeKind::Quest => (theme.node_fill.as_str(), zone_color(node.zone_id), 1.6),
    };
    let _ = write!(
        out,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"10\" ry=\"10\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
        node.x, node.y, node.width, node.height
    );

    let text_x = node.x + 12.0;
    let line_height = theme.font_size * 1.3;
    let mut text_y = node.y + 12.0 + theme.font_size;
    for line in wrap_title(&node.title) {
        let _ = write!(
            out,
            "<text x=\"{text_x:.2}\" y=\"{text_y:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.font_size,
            theme.node_text_color,
            escape_xml(&line)
        );
        text_y += line_height;
    }

    let mut meta: Vec<String> = Vec::new();
    if let NodeKind::Quest = node.kind {
        meta.push(zone_by_id_prefix(&node.id).name.to_string());
        if node.required_level > 0 {
            meta.push(format!("Lv {}", node.required_level));
        }
    }
    if node.completed {
        meta.push("done".to_string());
    }
    if !meta.is_empty() {
        let _ = write!(
            out,
            "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            node.bottom() - 12.0,
            theme.font_family,
            theme.font_size * 0.85,
            theme.node_muted_text_color,
            escape_xml(&meta.join(" · "))
        );
    }
    out.push_str("</g>");
    out
}

fn wrap_title(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in title.split_whitespace() {
        if !current.is_empty()
            && current.chars().count() + 1 + word.chars().count() > TITLE_CHARS_PER_LINE
        {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.len() > TITLE_MAX_LINES {
        lines.truncate(TITLE_MAX_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::config::LayoutConfig;
    use crate::feed::ManualOverrides;
    use crate::graph::{GraphInputs, build_graph};
    use crate::ir::Quest;
    use crate::layout::{HeuristicHeight, RankedSolver, compute_layout};
    use std::collections::HashSet;

    fn rendered(hide_completed: bool) -> String {
        let mut excluded = Quest {
            id: "Q3".to_string(),
            title: "Choose <the> Other Path".to_string(),
            ..Quest::default()
        };
        excluded.not_prerequisites = vec!["Q1".to_string()];
        let quests = vec![
            Quest {
                id: "Q1".to_string(),
                title: "Find the Sword".to_string(),
                required_level: Some(5),
                ..Quest::default()
            },
            Quest {
                id: "Q2".to_string(),
                title: "Find the Shield".to_string(),
                prerequisites: vec!["Q1".to_string()],
                ..Quest::default()
            },
            excluded,
        ];
        let done: HashSet<String> = ["Q1".to_string()].into_iter().collect();
        let inputs = GraphInputs {
            hide_completed,
            completed: Some(&done),
            ..GraphInputs::default()
        };
        let mut graph = build_graph(&quests, &ManualOverrides::default(), &inputs);
        classify(&mut graph);
        let layout = compute_layout(
            &graph,
            Direction::LeftRight,
            &LayoutConfig::default(),
            &RankedSolver,
            &HeuristicHeight::default(),
        )
        .unwrap();
        render_svg(&layout, &Theme::night(), &RenderConfig::default())
    }

    #[test]
    fn render_svg_draws_nodes_and_both_edge_kinds() {
        let svg = rendered(false);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Find the Sword"));
        assert!(svg.contains("Level 5"));
        assert!(svg.contains("Choose &lt;the&gt; Other Path"));
        assert!(svg.contains("url(#arrow-positive)"));
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(!svg.contains("<g opacity"));
    }

    #[test]
    fn hidden_completed_nodes_are_dimmed() {
        let svg = rendered(true);
        assert!(svg.contains("<g opacity=\"0.35\">"));
    }

    #[test]
    fn long_titles_wrap_and_truncate() {
        let lines = wrap_title(&"word ".repeat(40));
        assert_eq!(lines.len(), TITLE_MAX_LINES);
        assert!(lines.iter().all(|line| line.chars().count() <= TITLE_CHARS_PER_LINE + 1));
        assert!(lines[2].ends_with('…'));
    }
}
