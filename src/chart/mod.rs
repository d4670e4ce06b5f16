//! Chart Layout Engines
//!
//! Pure geometry for the dashboard's four chart types. Each engine takes
//! chart-ready series plus viewport dimensions and produces screen-space
//! shapes, axis ticks and colours; nothing here touches the data sources.

pub mod arc;
pub mod calendar;
pub mod chords;
pub mod color;
pub mod format;
pub mod line;
pub mod path;
pub mod pie;
pub mod scale;

pub use arc::{AngularSpan, ArcShape, RibbonShape};
pub use calendar::{CalendarCell, CalendarGeometry};
pub use chords::{ChordGeometry, ChordGroup, ChordRibbon, GroupTick};
pub use color::{interpolate_rgb, quantize, Rgb};
pub use format::{format_prefix_kilo, format_si, precision_prefix, time_tick_label};
pub use line::{
    AxisTick, LineChart, LineFrame, LineGeometry, Margins, PathTransition, SeriesGeometry,
    DATA_TRANSITION_MS,
};
pub use path::{
    area_monotone_x, monotone_x, simplify, PathGeometry, PathInterpolator, PathSegment, Point,
};
pub use pie::{PieConfig, PieGeometry, PieSlice, RingOutline};
pub use scale::{ticks, LinearScale, OrdinalScale, TimeInterval, TimeScale, TimeUnit};
