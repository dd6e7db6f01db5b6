pub type Color = String;

/// One column of a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TracePoint {
    pub value: f64,
    pub color: Color,
}

/// A line drawn through one point per column, scaled to fill `height`.
#[derive(Debug, Clone)]
pub struct Trace {
    pub xpos: u32,
    pub ypos: u32,
    pub height: u32,
    pub points: Vec<TracePoint>,
}

impl Trace {
    /// Smallest and largest finite values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Seg {
    pub width: u32,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub xpos: u32,
    pub ypos: u32,
    pub height: u32,
    pub title: Option<String>,
    pub segs: Vec<Seg>,
    pub outline: bool,
}

impl Track {
    pub fn width(&self) -> u32 {
        self.segs.iter().map(|seg| seg.width).sum()
    }
}

/// Tick marks with text, placed at column offsets from `xpos`.
#[derive(Debug, Clone)]
pub struct Axis {
    pub xpos: u32,
    pub ypos: u32,
    pub ticks: Vec<(u32, String)>,
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub xpos: u32,
    pub ypos: u32,
    pub height: u32,
    pub labels: Vec<(String, Color)>,
}

#[derive(Debug, Clone)]
pub struct TrackPlot {
    pub title: Option<String>,
    pub traces: Vec<Trace>,
    pub tracks: Vec<Track>,
    pub axis: Option<Axis>,
    pub legend: Legend,
}

impl TrackPlot {
    /// Width in columns of the widest trace or track.
    pub fn columns(&self) -> u32 {
        let traces = self
            .traces
            .iter()
            .map(|trace| trace.xpos + trace.points.len() as u32);
        let tracks = self.tracks.iter().map(|track| track.xpos + track.width());
        traces.chain(tracks).max().unwrap_or(0)
    }

    pub fn rows(&self) -> u32 {
        self.legend.ypos + self.legend.height
    }
}
