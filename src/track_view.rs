//!
//! Map view for a track.
//!
//! Draws the track on a braille canvas fitted to its bounds.
//! Without a track a world map around a default center is shown.
//!
use crate::track::{Bounds, Track};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Context, Line, Map, MapResolution, Points};
use ratatui::widgets::{Block, Widget};

/// Margin around the track, relative to its extent.
pub const MARGIN: f64 = 0.05;

/// Half the extent of the overview map in degrees `(lon, lat)`.
const OVERVIEW_SPAN: (f64, f64) = (60.0, 30.0);

/// Map view.
#[derive(Debug, Clone)]
pub struct TrackView<'a> {
    track: Option<&'a Track>,
    /// `(lat, lon)`
    center: (f64, f64),
    style: Style,
    track_color: Color,
    map_color: Color,
    block: Option<Block<'a>>,
}

impl Default for TrackView<'_> {
    fn default() -> Self {
        Self {
            track: None,
            center: (0.0, 0.0),
            style: Default::default(),
            track_color: Color::LightRed,
            map_color: Color::DarkGray,
            block: None,
        }
    }
}

impl<'a> TrackView<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(mut self, track: Option<&'a Track>) -> Self {
        self.track = track;
        self
    }

    /// Center of the overview map as `(lat, lon)`.
    pub fn center(mut self, center: (f64, f64)) -> Self {
        self.center = center;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn track_color(mut self, color: Color) -> Self {
        self.track_color = color;
        self
    }

    pub fn map_color(mut self, color: Color) -> Self {
        self.map_color = color;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Visible area as `([min_lon, max_lon], [min_lat, max_lat])`.
    pub fn viewport(&self) -> ([f64; 2], [f64; 2]) {
        match self.track {
            Some(track) => {
                let b = track.bounds().with_margin(MARGIN);
                ([b.min_lon, b.max_lon], [b.min_lat, b.max_lat])
            }
            None => overview(self.center),
        }
    }
}

fn overview(center: (f64, f64)) -> ([f64; 2], [f64; 2]) {
    let (lat, lon) = center;
    let b = Bounds {
        min_lon: (lon - OVERVIEW_SPAN.0).max(-180.0),
        min_lat: (lat - OVERVIEW_SPAN.1).max(-90.0),
        max_lon: (lon + OVERVIEW_SPAN.0).min(180.0),
        max_lat: (lat + OVERVIEW_SPAN.1).min(90.0),
    };
    ([b.min_lon, b.max_lon], [b.min_lat, b.max_lat])
}

impl Widget for &TrackView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_ref(self, area, buf);
    }
}

impl Widget for TrackView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_ref(&self, area, buf);
    }
}

fn render_ref(widget: &TrackView<'_>, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, widget.style);

    match widget.track {
        Some(track) => {
            let points = track.points();
            canvas(widget, |ctx| {
                for w in points.windows(2) {
                    ctx.draw(&Line {
                        x1: w[0].0,
                        y1: w[0].1,
                        x2: w[1].0,
                        y2: w[1].1,
                        color: widget.track_color,
                    });
                }
                if points.len() == 1 {
                    ctx.draw(&Points {
                        coords: points,
                        color: widget.track_color,
                    });
                }
            })
            .render(area, buf);
        }
        None => {
            let (lat, lon) = widget.center;
            canvas(widget, |ctx| {
                ctx.draw(&Map {
                    resolution: MapResolution::High,
                    color: widget.map_color,
                });
                ctx.layer();
                ctx.draw(&Points {
                    coords: &[(lon, lat)],
                    color: widget.track_color,
                });
            })
            .render(area, buf);
        }
    }
}

/// Canvas over the viewport. Each painter has its own type.
fn canvas<'a, F>(widget: &TrackView<'a>, painter: F) -> Canvas<'a, F>
where
    F: Fn(&mut Context<'_>),
{
    let (x_bounds, y_bounds) = widget.viewport();
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .background_color(widget.style.bg.unwrap_or(Color::Reset))
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(painter);
    match &widget.block {
        Some(block) => canvas.block(block.clone().style(widget.style)),
        None => canvas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport() {
        let track = Track::parse(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":
            {"type":"LineString","coordinates":[[10.0,20.0],[12.0,21.0]]}}]}"#,
        )
        .unwrap();
        let view = TrackView::new().track(Some(&track));
        let (x, y) = view.viewport();
        assert!((x[0] - 9.9).abs() < 1e-9);
        assert!((x[1] - 12.1).abs() < 1e-9);
        assert!((y[0] - 19.95).abs() < 1e-9);
        assert!((y[1] - 21.05).abs() < 1e-9);

        let view = TrackView::new().center((30.5, 114.3));
        let (x, y) = view.viewport();
        assert_eq!(x, [54.3, 174.3]);
        assert_eq!(y, [0.5, 60.5]);

        let view = TrackView::new().center((80.0, 170.0));
        let (x, y) = view.viewport();
        assert_eq!(x[1], 180.0);
        assert_eq!(y[1], 90.0);
    }

    #[test]
    fn test_render() {
        let track = Track::parse(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":
            {"type":"LineString","coordinates":[[10.0,20.0],[12.0,21.0]]}}]}"#,
        )
        .unwrap();
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        TrackView::new().track(Some(&track)).render(area, &mut buf);

        let drawn = buf.content().iter().filter(|c| c.symbol() != " ").count();
        assert!(drawn > 0);
    }

    #[test]
    fn test_render_overview() {
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        TrackView::new()
            .center((30.5, 114.3))
            .block(Block::bordered())
            .render(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "┌");
        let drawn = buf.content().iter().filter(|c| c.symbol() != " ").count();
        assert!(drawn > 2 * 40 + 2 * 10);
    }
}
