use serde_json::{json, Value};

use crate::config::FigureConfig;
use crate::layout::{Layout, Point, PositionedEdge};

const NODE_COLOR: &str = "LightSkyBlue";
const NODE_SIZE: u32 = 50;
const HOVER_MARKER_SIZE: u32 = 20;
const MARGIN: u32 = 40;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const LIGHT_CORAL: Rgb = Rgb(240, 128, 128);
    pub const DARK_RED: Rgb = Rgb(139, 0, 0);

    /// Linear blend, `t` in `[0, 1]`
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    pub fn css(self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// `n` colours running from light coral to dark red
pub fn edge_gradient(n: usize) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![Rgb::LIGHT_CORAL],
        _ => (0..n)
            .map(|i| Rgb::LIGHT_CORAL.lerp(Rgb::DARK_RED, i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// Turns a [`Layout`] into a plotly-style figure: `{"data": [...], "layout": {...}}`.
#[derive(Debug, Clone, Default)]
pub struct FigureBuilder {
    config: FigureConfig,
}

impl FigureBuilder {
    pub fn new(config: FigureConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, layout: &Layout) -> Value {
        if layout.is_placeholder() {
            return self.placeholder(layout);
        }

        let mut data: Vec<Value> = layout
            .edges
            .iter()
            .zip(edge_gradient(layout.edges.len()))
            .filter_map(|(edge, color)| edge_trace(layout, edge, color))
            .collect();
        data.push(self.node_trace(layout));
        data.push(midpoint_trace(layout));

        let annotations: Vec<Value> = layout
            .edges
            .iter()
            .filter_map(|edge| arrow(layout, edge))
            .collect();

        let mut figure_layout = self.base_layout();
        figure_layout["hovermode"] = json!("closest");
        figure_layout["clickmode"] = json!("event+select");
        figure_layout["annotations"] = Value::Array(annotations);

        json!({ "data": data, "layout": figure_layout })
    }

    /// One centred node and an invisible twin for hovering
    fn placeholder(&self, layout: &Layout) -> Value {
        let (x, y, label) = layout
            .nodes
            .first()
            .map(|node| (node.x, node.y, node.label.clone()))
            .unwrap_or((1.0, 1.0, String::new()));

        json!({
            "data": [
                {
                    "type": "scatter",
                    "x": [x],
                    "y": [y],
                    "text": [label],
                    "textposition": "bottom center",
                    "mode": "markers+text",
                    "marker": { "size": NODE_SIZE, "color": NODE_COLOR },
                },
                {
                    "type": "scatter",
                    "x": [x],
                    "y": [y],
                    "mode": "markers",
                    "marker": { "size": NODE_SIZE, "color": NODE_COLOR },
                    "opacity": 0,
                },
            ],
            "layout": self.base_layout(),
        })
    }

    fn node_trace(&self, layout: &Layout) -> Value {
        let xs: Vec<f64> = layout.nodes.iter().map(|n| n.x).collect();
        let ys: Vec<f64> = layout.nodes.iter().map(|n| n.y).collect();
        let text: Vec<&str> = layout.nodes.iter().map(|n| n.label.as_str()).collect();
        let hovertext: Vec<&str> = layout.nodes.iter().map(|n| n.hovertext.as_str()).collect();

        json!({
            "type": "scatter",
            "x": xs,
            "y": ys,
            "text": text,
            "hovertext": hovertext,
            "mode": "markers+text",
            "textposition": "bottom center",
            "hoverinfo": "text",
            "marker": { "size": NODE_SIZE, "color": NODE_COLOR },
        })
    }

    fn base_layout(&self) -> Value {
        let hidden_axis = json!({ "showgrid": false, "zeroline": false, "showticklabels": false });
        json!({
            "title": self.config.title,
            "showlegend": false,
            "margin": { "b": MARGIN, "l": MARGIN, "r": MARGIN, "t": MARGIN },
            "xaxis": hidden_axis,
            "yaxis": hidden_axis,
            "height": self.config.height,
        })
    }
}

fn endpoints(layout: &Layout, edge: &PositionedEdge) -> Option<(Point, Point)> {
    Some((layout.position(&edge.from)?, layout.position(&edge.to)?))
}

/// Parent to child
fn edge_trace(layout: &Layout, edge: &PositionedEdge, color: Rgb) -> Option<Value> {
    let (child, parent) = endpoints(layout, edge)?;
    Some(json!({
        "type": "scatter",
        "x": [parent.x, child.x, null],
        "y": [parent.y, child.y, null],
        "mode": "lines",
        "line": { "color": color.css(), "shape": "spline" },
        "hoverinfo": "none",
        "opacity": 1,
    }))
}

fn midpoint_trace(layout: &Layout) -> Value {
    let xs: Vec<f64> = layout.edges.iter().map(|e| e.midpoint_x).collect();
    let ys: Vec<f64> = layout.edges.iter().map(|e| e.midpoint_y).collect();
    let hovertext: Vec<&str> = layout.edges.iter().map(|e| e.hovertext.as_str()).collect();

    json!({
        "type": "scatter",
        "x": xs,
        "y": ys,
        "hovertext": hovertext,
        "mode": "markers",
        "hoverinfo": "text",
        "marker": { "size": HOVER_MARKER_SIZE, "color": NODE_COLOR },
        "opacity": 0,
    })
}

/// From the edge midpoint to three quarters of the way towards the child
fn arrow(layout: &Layout, edge: &PositionedEdge) -> Option<Value> {
    let (child, parent) = endpoints(layout, edge)?;
    Some(json!({
        "ax": edge.midpoint_x,
        "ay": edge.midpoint_y,
        "axref": "x",
        "ayref": "y",
        "x": (child.x * 3.0 + parent.x) / 4.0,
        "y": (child.y * 3.0 + parent.y) / 4.0,
        "xref": "x",
        "yref": "y",
        "showarrow": true,
        "arrowhead": 3,
        "arrowsize": 4,
        "arrowwidth": 1,
        "opacity": 1,
    }))
}
