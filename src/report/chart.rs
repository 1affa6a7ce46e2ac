// Donut charts of rating distributions, as SVG or PNG.

use std::f64::consts::PI;
use std::fmt::Write as _;

use base64::{engine::general_purpose::STANDARD, Engine};
use resvg::{tiny_skia, usvg};

use crate::report::report_types::ReportProfile;
use crate::report::*;

pub const CHART_WIDTH: u32 = 700;
pub const CHART_HEIGHT: u32 = 450;
/// The raster variant is drawn at twice the nominal size.
pub const RASTER_SCALE: u32 = 2;
pub const CHART_TITLE: &str = "Response Distribution";

/// Inner radius, as a fraction of the outer radius.
const HOLE: f64 = 0.4;
/// Offset of the first segment, as a fraction of the outer radius.
const PULL: f64 = 0.05;
const OUTER_RADIUS: f64 = 160.0;
const TITLE_HEIGHT: f64 = 40.0;
/// Labels of thinner segments would not fit and are left out.
const MIN_LABEL_PERCENT: f64 = 4.0;
const EMPTY_COLOR: &str = "#e0e0e0";
const FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChartTarget {
    /// Vector chart with hover tooltips, for on-screen previews.
    Interactive,
    /// High resolution bitmap, for printed documents.
    Raster,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChartArtifact {
    Svg(String),
    Png {
        bytes: Vec<u8>,
        width: u32,
        height: u32,
    },
}

impl ChartArtifact {
    /// The chart as a `data:` URI, to embed in a self-contained document.
    pub fn data_uri(&self) -> String {
        match self {
            ChartArtifact::Svg(svg) => {
                format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
            }
            ChartArtifact::Png { bytes, .. } => {
                format!("data:image/png;base64,{}", STANDARD.encode(bytes))
            }
        }
    }

    pub fn as_svg(&self) -> Option<&str> {
        match self {
            ChartArtifact::Svg(s) => Some(s.as_str()),
            ChartArtifact::Png { .. } => None,
        }
    }
}

/// One slice of the donut. Angles are in radians, clockwise from 12 o'clock.
#[derive(PartialEq, Debug, Clone)]
pub struct Segment {
    pub category: String,
    pub count: u64,
    pub percent: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: String,
    pub pulled: bool,
}

impl Segment {
    fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }
}

/// Lays out the segments of a distribution, in category order.
///
/// Categories without responses get no segment. Only the first category of
/// the order is pulled out, and only if it has responses.
pub fn segments(distribution: &RatingDistribution, profile: &ReportProfile) -> Vec<Segment> {
    let total = distribution.total();
    if total == 0 {
        return vec![];
    }
    let mut res: Vec<Segment> = Vec::new();
    let mut angle = 0.0;
    for (idx, ((category, count), (_, percent))) in distribution
        .counts
        .iter()
        .zip(distribution.percentages())
        .enumerate()
    {
        if *count == 0 {
            continue;
        }
        let sweep = *count as f64 / total as f64 * 2.0 * PI;
        res.push(Segment {
            category: category.clone(),
            count: *count,
            percent,
            start_angle: angle,
            end_angle: angle + sweep,
            color: profile.color_of(category).to_string(),
            pulled: idx == 0,
        });
        angle += sweep;
    }
    res
}

fn center() -> (f64, f64) {
    (
        CHART_WIDTH as f64 / 2.0,
        (CHART_HEIGHT as f64 + TITLE_HEIGHT) / 2.0,
    )
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.sin(), cy - r * angle.cos())
}

/// The path of a ring sector. Each arc is drawn in two halves so that a
/// full ring needs no special case.
fn sector_path(cx: f64, cy: f64, outer: f64, inner: f64, start: f64, end: f64) -> String {
    let mid = (start + end) / 2.0;
    let (ox0, oy0) = polar(cx, cy, outer, start);
    let (oxm, oym) = polar(cx, cy, outer, mid);
    let (ox1, oy1) = polar(cx, cy, outer, end);
    let (ix1, iy1) = polar(cx, cy, inner, end);
    let (ixm, iym) = polar(cx, cy, inner, mid);
    let (ix0, iy0) = polar(cx, cy, inner, start);
    format!(
        "M {:.2} {:.2} A {o:.2} {o:.2} 0 0 1 {:.2} {:.2} A {o:.2} {o:.2} 0 0 1 {:.2} {:.2} \
         L {:.2} {:.2} A {i:.2} {i:.2} 0 0 0 {:.2} {:.2} A {i:.2} {i:.2} 0 0 0 {:.2} {:.2} Z",
        ox0,
        oy0,
        oxm,
        oym,
        ox1,
        oy1,
        ix1,
        iy1,
        ixm,
        iym,
        ix0,
        iy0,
        o = outer,
        i = inner
    )
}

fn escape(s: &str) -> String {
    html_escape::encode_text(s).to_string()
}

/// The SVG markup of a chart. Tooltips and hover styles are only added for
/// the interactive target.
pub fn svg_markup(segments: &[Segment], target: ChartTarget) -> String {
    let (cx, cy) = center();
    let inner = OUTER_RADIUS * HOLE;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' class='rating-chart' width='{w}' height='{h}' viewBox='0 0 {w} {h}'>",
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    if target == ChartTarget::Interactive {
        let _ = writeln!(
            svg,
            "  <style>.segment:hover {{ opacity: 0.8; cursor: pointer; }}</style>"
        );
    }
    let _ = writeln!(
        svg,
        "  <rect width='{}' height='{}' fill='#ffffff'/>",
        CHART_WIDTH, CHART_HEIGHT
    );
    let _ = writeln!(
        svg,
        "  <text x='{:.0}' y='28' text-anchor='middle' font-family='{}' font-size='18' fill='#333333'>{}</text>",
        cx, FONT_FAMILY, CHART_TITLE
    );

    if segments.is_empty() {
        let _ = writeln!(
            svg,
            "  <path d='{}' fill='{}'/>",
            sector_path(cx, cy, OUTER_RADIUS, inner, 0.0, 2.0 * PI),
            EMPTY_COLOR
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.2}' y='{:.2}' text-anchor='middle' dominant-baseline='middle' font-family='{}' font-size='14' fill='#666666'>No responses</text>",
            cx, cy, FONT_FAMILY
        );
        let _ = writeln!(svg, "</svg>");
        return svg;
    }

    for seg in segments.iter() {
        let (dx, dy) = if seg.pulled {
            polar(0.0, 0.0, PULL * OUTER_RADIUS, seg.mid_angle())
        } else {
            (0.0, 0.0)
        };
        let _ = writeln!(
            svg,
            "  <g class='segment' transform='translate({:.2} {:.2})'>",
            dx, dy
        );
        let _ = writeln!(
            svg,
            "    <path d='{}' fill='{}' stroke='#ffffff' stroke-width='1'/>",
            sector_path(cx, cy, OUTER_RADIUS, inner, seg.start_angle, seg.end_angle),
            seg.color
        );
        if target == ChartTarget::Interactive {
            let _ = writeln!(
                svg,
                "    <title>{}: {} ({:.1}%)</title>",
                escape(&seg.category),
                seg.count,
                seg.percent
            );
        }
        if seg.percent >= MIN_LABEL_PERCENT {
            let (lx, ly) = polar(cx, cy, (OUTER_RADIUS + inner) / 2.0, seg.mid_angle());
            let _ = writeln!(
                svg,
                "    <text x='{lx:.2}' y='{:.2}' text-anchor='middle' font-family='{}' font-size='12' fill='#ffffff'>",
                ly - 2.0,
                FONT_FAMILY,
                lx = lx
            );
            let _ = writeln!(
                svg,
                "      <tspan x='{lx:.2}'>{}</tspan><tspan x='{lx:.2}' dy='14'>{:.1}%</tspan>",
                escape(&seg.category),
                seg.percent,
                lx = lx
            );
            let _ = writeln!(svg, "    </text>");
        }
        let _ = writeln!(svg, "  </g>");
    }
    let _ = writeln!(svg, "</svg>");
    svg
}

fn raster_error(detail: String) -> ReportError {
    ReportError::ChartRaster { detail }
}

fn rasterize_with(svg: &str, options: &usvg::Options) -> ReportResult<ChartArtifact> {
    let tree = usvg::Tree::from_data(svg.as_bytes(), options)
        .map_err(|e| raster_error(format!("SVG parse failed: {:?}", e)))?;
    let width = CHART_WIDTH * RASTER_SCALE;
    let height = CHART_HEIGHT * RASTER_SCALE;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).context(ChartRasterSnafu {
        detail: "pixmap allocation failed",
    })?;
    // Opaque background: premultiplied and straight alpha are then the same.
    pixmap.fill(tiny_skia::Color::WHITE);
    let scale = RASTER_SCALE as f32;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let mut bytes: Vec<u8> = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .write_header()
            .map_err(|e| raster_error(e.to_string()))?
            .write_image_data(pixmap.data())
            .map_err(|e| raster_error(e.to_string()))?;
    }
    Ok(ChartArtifact::Png {
        bytes,
        width,
        height,
    })
}

/// Turns chart markup into PNG images. The system fonts are loaded once for
/// the whole batch.
pub fn rasterize_all(svgs: &[String]) -> ReportResult<Vec<ChartArtifact>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    svgs.iter().map(|svg| rasterize_with(svg, &options)).collect()
}

/// Draws the charts of several distributions for one target.
pub fn render_charts(
    distributions: &[&RatingDistribution],
    profile: &ReportProfile,
    target: ChartTarget,
) -> ReportResult<Vec<ChartArtifact>> {
    let svgs: Vec<String> = distributions
        .iter()
        .map(|d| svg_markup(&segments(d, profile), target))
        .collect();
    match target {
        ChartTarget::Interactive => Ok(svgs.into_iter().map(ChartArtifact::Svg).collect()),
        ChartTarget::Raster => rasterize_all(&svgs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::report_types::ReportType;

    fn dist(counts: &[(&str, u64)]) -> RatingDistribution {
        RatingDistribution {
            counts: counts.iter().map(|(c, n)| (c.to_string(), *n)).collect(),
            excluded: 0,
        }
    }

    fn faculty_dist(counts: [u64; 5]) -> RatingDistribution {
        let labels = ["Excellent", "Very Good", "Good", "Satisfactory", "Poor"];
        dist(&labels.iter().cloned().zip(counts).collect::<Vec<_>>())
    }

    #[test]
    fn segments_skip_empty_categories() {
        let profile = ReportType::Faculty.profile();
        let segs = segments(&faculty_dist([2, 0, 0, 0, 1]), &profile);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].category, "Excellent");
        assert!(segs[0].pulled);
        assert!(!segs[1].pulled);
        assert_eq!(segs[1].color, "#9467bd");
        assert!((segs[0].end_angle - 4.0 * PI / 3.0).abs() < 1e-9);
        assert!((segs[1].end_angle - 2.0 * PI).abs() < 1e-9);
        assert!((segs[0].percent - 66.666).abs() < 0.01);
    }

    #[test]
    fn first_category_without_responses_is_not_pulled() {
        let profile = ReportType::Faculty.profile();
        let segs = segments(&faculty_dist([0, 3, 1, 0, 0]), &profile);
        assert!(segs.iter().all(|s| !s.pulled));
    }

    #[test]
    fn labels_and_tooltips() {
        let profile = ReportType::Faculty.profile();
        let segs = segments(&faculty_dist([2, 0, 0, 0, 1]), &profile);
        let interactive = svg_markup(&segs, ChartTarget::Interactive);
        assert!(interactive.contains("<title>Excellent: 2 (66.7%)</title>"));
        assert!(interactive.contains("33.3%"));
        assert!(interactive.contains(CHART_TITLE));
        let raster = svg_markup(&segs, ChartTarget::Raster);
        assert!(!raster.contains("<title>"));
        assert!(raster.contains("66.7%"));
    }

    #[test]
    fn empty_distribution_draws_placeholder() {
        let profile = ReportType::Course.profile();
        let segs = segments(&dist(&[("Agree", 0), ("Neutral", 0)]), &profile);
        assert!(segs.is_empty());
        let svg = svg_markup(&segs, ChartTarget::Interactive);
        assert!(svg.contains("No responses"));
        assert!(svg.contains(EMPTY_COLOR));
    }

    #[test]
    fn svg_data_uri() {
        let a = ChartArtifact::Svg("<svg/>".to_string());
        assert_eq!(a.data_uri(), "data:image/svg+xml;base64,PHN2Zy8+");
        assert_eq!(a.as_svg(), Some("<svg/>"));
    }

    #[test]
    fn raster_chart_is_png() {
        let profile = ReportType::Faculty.profile();
        let d = faculty_dist([1, 1, 0, 0, 0]);
        let mut charts = render_charts(&[&d], &profile, ChartTarget::Raster).unwrap();
        assert_eq!(charts.len(), 1);
        match charts.remove(0) {
            ChartArtifact::Png { bytes, width, height } => {
                assert_eq!((width, height), (1400, 900));
                assert_eq!(&bytes[1..4], b"PNG");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
