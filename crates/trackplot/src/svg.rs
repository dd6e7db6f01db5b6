use crate::trackplot::{Axis, Color, Legend, Trace, Track, TrackPlot};
use std::fmt::{self, Write};
use std::path::Path;

const DEFAULT_WIDTH: f64 = 1500.0;
const DEFAULT_Y_SCALE: f64 = 3.0;
const DEFAULT_PADDING: f64 = 12.0;
const TITLE_HEIGHT: f64 = 24.0;

pub fn render_from_string(svg_content: &str, path: &Path) -> Result<(), String> {
    std::fs::write(path, svg_content).map_err(|e| e.to_string())
}

pub fn generate_string(plot: &TrackPlot) -> Result<String, String> {
    let columns = plot.columns().max(1);
    let scale = (DEFAULT_WIDTH / columns as f64, DEFAULT_Y_SCALE);
    let top = if plot.title.is_some() { TITLE_HEIGHT } else { 0.0 };
    let mut generator = Generator::new(scale, DEFAULT_PADDING, top);
    generator
        .generate(plot)
        .map_err(|_| "Failed to format SVG".to_string())?;
    Ok(generator.out)
}

struct Generator {
    scale: (f64, f64),
    pad: f64,
    top: f64,
    out: String,
}

impl Generator {
    fn new(scale: (f64, f64), pad: f64, top: f64) -> Self {
        Self {
            scale,
            pad,
            top,
            out: String::new(),
        }
    }

    fn generate(&mut self, plot: &TrackPlot) -> fmt::Result {
        let (width, height) = self.get_dimensions(plot);
        self.start_svg(width, height)?;
        self.add_background()?;
        if let Some(title) = &plot.title {
            self.add_text((self.pad, self.pad + 12.0), title, 16, "start")?;
        }

        for trace in &plot.traces {
            self.plot_trace(trace)?;
        }
        for track in &plot.tracks {
            self.plot_track(track)?;
            if track.outline {
                self.plot_outline(track)?;
            }
        }
        if let Some(axis) = &plot.axis {
            self.plot_axis(axis)?;
        }
        self.plot_legend(&plot.legend)?;
        self.end_svg()
    }

    fn plot_trace(&mut self, trace: &Trace) -> fmt::Result {
        let Some((lo, hi)) = trace.value_range() else {
            return Ok(());
        };
        let x = self.to_x(trace.xpos) + self.pad;
        let y = self.to_y(trace.ypos) + self.pad + self.top;
        let height = self.to_y(trace.height);
        let span = if hi > lo { hi - lo } else { 1.0 };
        let column_width = self.scale.0;
        let to_point = |column: usize, value: f64| {
            let px = x + (column as f64 + 0.5) * column_width;
            let py = y + height * (1.0 - (value.clamp(lo, hi) - lo) / span);
            format!("{px:.2},{py:.2}")
        };

        // One polyline per run of equal color, joined to the next run's first point.
        let points = &trace.points;
        let mut start = 0;
        while start < points.len() {
            let color = &points[start].color;
            let mut end = start + 1;
            while end < points.len() && points[end].color == *color {
                end += 1;
            }
            let stop = (end + 1).min(points.len());
            let coords: Vec<String> = (start..stop)
                .filter(|&i| points[i].value.is_finite())
                .map(|i| to_point(i, points[i].value))
                .collect();
            if !coords.is_empty() {
                writeln!(
                    self.out,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1" />"#,
                    coords.join(" "),
                    color
                )?;
            }
            start = end;
        }
        Ok(())
    }

    fn plot_track(&mut self, track: &Track) -> fmt::Result {
        let x = self.to_x(track.xpos) + self.pad;
        let y = self.to_y(track.ypos) + self.pad + self.top;
        let height = self.to_y(track.height);

        if let Some(title) = &track.title {
            self.add_text((x, y - 3.0), title, 11, "start")?;
        }
        let mut x_cur = x;
        for seg in &track.segs {
            let width = self.to_x(seg.width);
            self.add_rect((x_cur, y), (width, height), &seg.color)?;
            x_cur += width;
        }
        Ok(())
    }

    fn plot_outline(&mut self, track: &Track) -> fmt::Result {
        let height = self.to_y(track.height);
        let width = self.to_x(track.width());
        let x = self.to_x(track.xpos) + self.pad;
        let y = self.to_y(track.ypos) + self.pad + self.top;
        writeln!(
            self.out,
            r##"<rect x="{x}" y="{y}" width="{width}" height="{height}" stroke="#000000" stroke-width="1" fill="transparent" />"##
        )
    }

    fn plot_axis(&mut self, axis: &Axis) -> fmt::Result {
        let y = self.to_y(axis.ypos) + self.pad + self.top;
        for (offset, label) in &axis.ticks {
            let x = self.to_x(axis.xpos + offset) + self.pad;
            writeln!(
                self.out,
                r#"<line x1="{x}" y1="{y}" x2="{x}" y2="{}" stroke="black" stroke-width="1" />"#,
                y + 6.0
            )?;
            self.add_text((x, y + 18.0), label, 11, "middle")?;
        }
        Ok(())
    }

    fn plot_legend(&mut self, legend: &Legend) -> fmt::Result {
        let base_y = self.to_y(legend.ypos) + self.pad + self.top;
        let height = self.to_y(legend.height);
        let mut x = self.to_x(legend.xpos) + self.pad;
        for (label, color) in &legend.labels {
            self.add_rect((x, base_y), (height, height), color)?;
            x += height + 2.0;
            self.add_text((x, base_y + height - 1.0), label, 14, "start")?;
            x += 5.0 * (2 * label.len() + 1) as f64;
        }
        Ok(())
    }

    fn add_rect(&mut self, pos: (f64, f64), dims: (f64, f64), color: &Color) -> fmt::Result {
        let (x, y) = pos;
        let (w, h) = dims;
        writeln!(
            self.out,
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{color}" stroke="{color}" stroke-width="0" opacity="0.9" />"#
        )
    }

    fn add_text(&mut self, pos: (f64, f64), text: &str, size: u32, anchor: &str) -> fmt::Result {
        writeln!(
            self.out,
            r#"<text x="{}" y="{}" font-family="monospace" font-size="{}px" text-anchor="{}">{}</text>"#,
            pos.0,
            pos.1,
            size,
            anchor,
            escape(text)
        )
    }

    fn get_dimensions(&self, plot: &TrackPlot) -> (f64, f64) {
        let xdim = self.to_x(plot.columns()) + 2.0 * self.pad;
        let ydim = self.to_y(plot.rows()) + 2.0 * self.pad + self.top;
        (xdim, ydim)
    }

    fn start_svg(&mut self, width: f64, height: f64) -> fmt::Result {
        writeln!(self.out, r#"<?xml version="1.0"?>"#)?;
        writeln!(
            self.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
        )
    }

    fn end_svg(&mut self) -> fmt::Result {
        writeln!(self.out, "</svg>")
    }

    fn add_background(&mut self) -> fmt::Result {
        writeln!(
            self.out,
            r#"<rect width="100%" height="100%" fill="white"/>"#
        )
    }

    fn to_x(&self, x: u32) -> f64 {
        x as f64 * self.scale.0
    }

    fn to_y(&self, y: u32) -> f64 {
        y as f64 * self.scale.1
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
