//! SVG export serializer.
//!
//! Converts a toolpath into an SVG string using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! The document is sized in millimetres with a `viewBox` equal to the
//! machine bounds, so one user unit is one millimetre and the file can be
//! plotted or printed at true scale. The whole toolpath becomes a single
//! `<path>` element using `M` (move to) and `L` (line to) commands.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>` and `<metadata>`
//! elements to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path as SvgPath, Rectangle, Title};
use svg::node::{Node, Text, Value};

use penplot_pipeline::{MachineBounds, Path};

/// Stroke width of the exported path, in millimetres.
const STROKE_WIDTH_MM: f64 = 0.5;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>`, `<desc>` and/or
/// `<metadata>` element is emitted immediately after the opening `<svg>`
/// tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically a short summary of the generation parameters.
    pub description: Option<&'a str>,

    /// Serialized path configuration, emitted inside `<metadata>` wrapped
    /// in a namespaced `<penplot:path>` element so exported files carry
    /// machine-parseable settings.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a toolpath.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for paths with fewer than 2 points.
///
/// Coordinates are formatted by the [`svg`] crate using `f32` precision,
/// far finer than any pen.
///
/// # Examples
///
/// ```
/// use penplot_pipeline::{Path, Point};
/// use penplot_export::build_path_data;
///
/// let path = Path::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&path);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(path: &Path) -> String {
    let points = path.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Serialize a toolpath into an SVG document string.
///
/// The document is `bounds.width` x `bounds.height` millimetres with a
/// matching `viewBox` and a white background. A path with fewer than two
/// points produces a document with no `<path>` element.
#[must_use]
pub fn to_svg(path: &Path, bounds: &MachineBounds, metadata: &SvgMetadata<'_>) -> String {
    let (w, h) = (bounds.width, bounds.height);
    let mut doc = Document::new()
        .set("width", format!("{w}mm"))
        .set("height", format!("{h}mm"))
        .set("viewBox", format!("0 0 {w} {h}"));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("penplot:path");
        config_el.assign("xmlns:penplot", "https://penplot.dev/ns/1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    doc = doc.add(
        Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", "white"),
    );

    let d = build_path_data(path);
    if !d.is_empty() {
        doc = doc.add(
            SvgPath::new()
                .set("d", d)
                .set("fill", "none")
                .set("stroke", "black")
                .set("stroke-width", STROKE_WIDTH_MM)
                .set("stroke-linejoin", "round"),
        );
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use penplot_pipeline::Point;

    use super::*;

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    fn bounds() -> MachineBounds {
        MachineBounds::new(600.0, 400.0)
    }

    #[test]
    fn empty_path_has_no_path_element() {
        let svg = to_svg(&Path::default(), &bounds(), &no_meta());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn single_point_has_no_path_element() {
        let path = Path::new(vec![Point::new(1.0, 1.0)]);
        assert!(build_path_data(&path).is_empty());
        let svg = to_svg(&path, &bounds(), &no_meta());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn whole_path_is_one_element() {
        let path = Path::new(vec![
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        ]);
        let svg = to_svg(&path, &bounds(), &no_meta());
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains(r#"d="M1,2 L3,4 L5,6""#));
    }

    #[test]
    fn viewbox_is_machine_millimetres() {
        let svg = to_svg(&Path::default(), &bounds(), &no_meta());
        assert!(svg.contains(r#"width="600mm""#));
        assert!(svg.contains(r#"height="400mm""#));
        assert!(svg.contains(r#"viewBox="0 0 600 400""#));
    }

    #[test]
    fn svg_has_xml_declaration_and_namespace() {
        let svg = to_svg(&Path::default(), &bounds(), &no_meta());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn title_and_desc_emitted_when_present() {
        let meta = SvgMetadata {
            title: Some("portrait"),
            description: Some("line spacing 10mm"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&Path::default(), &bounds(), &meta);
        assert!(svg.contains("<title>portrait</title>"));
        assert!(svg.contains("<desc>line spacing 10mm</desc>"));
    }

    #[test]
    fn title_and_desc_omitted_when_none() {
        let svg = to_svg(&Path::default(), &bounds(), &no_meta());
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
        assert!(!svg.contains("<metadata>"));
    }

    #[test]
    fn special_characters_in_title_are_escaped() {
        let meta = SvgMetadata {
            title: Some("a<b>&c"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&Path::default(), &bounds(), &meta);
        assert!(svg.contains("<title>a&lt;b&gt;&amp;c</title>"));
    }

    #[test]
    fn config_json_lands_in_metadata_before_path() {
        let meta = SvgMetadata {
            config_json: Some(r#"{"line_spacing":10}"#),
            ..SvgMetadata::default()
        };
        let path = Path::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let svg = to_svg(&path, &bounds(), &meta);
        let metadata_pos = svg.find("<metadata>");
        let path_pos = svg.find("<path");
        assert!(metadata_pos.is_some());
        assert!(metadata_pos < path_pos);
        assert!(svg.contains("xmlns:penplot="));
    }
}
