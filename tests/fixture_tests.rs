use datatest_stable::Utf8Path;
use glam::dvec2;
use taep::reproject::{WRAPPER_ID, canonical_endpoints};
use taep::{Config, Document, Locator, Reprojector, TapeSegment, Transform};

/// Tolerance for geometry that went through a full transform chain.
const TOLERANCE: f64 = 1e-6;

/// Fixtures declare what they contain on the root element.
fn expected(doc: &Document, name: &str) -> usize {
    doc.attribute(doc.root(), name)
        .unwrap_or_else(|| panic!("fixture is missing {name}"))
        .parse()
        .unwrap_or_else(|e| panic!("bad {name}: {e}"))
}

fn check_tape(doc: &Document, segment: &TapeSegment, others: &[&TapeSegment], rejections: usize) {
    let config = Config::default();
    let tape = Reprojector::from_config(&config)
        .reproject(doc, segment)
        .unwrap_or_else(|e| panic!("re-projecting {}: {e}", segment.path_id));
    let out = &tape.document;

    // Page box is the tape itself.
    let page = out.page().view_box.expect("output has a view box");
    assert_eq!((page.min_x, page.min_y), (0.0, 0.0));
    assert!((page.width - segment.length).abs() < TOLERANCE, "{page}");
    assert!((page.height - segment.width).abs() < TOLERANCE, "{page}");
    assert_eq!(
        out.attribute(out.root(), "width"),
        Some(format!("{}mm", segment.length_mm).as_str())
    );

    // The marker is gone from the copy but still in the source.
    assert!(!out.is_attached(segment.node), "marker {} leaked", segment.path_id);
    assert!(doc.is_attached(segment.node));

    // The wrapper puts the segment on the tape's center line.
    let wrapper = out.find_by_id(WRAPPER_ID).expect("wrapper group");
    let xf = Transform::parse(out.attribute(wrapper, "transform").unwrap()).unwrap();
    let (a, b) = canonical_endpoints(segment);
    assert!(xf.apply(segment.start).distance(a) < TOLERANCE);
    assert!(xf.apply(segment.end).distance(b) < TOLERANCE);
    assert!((a - dvec2(0.0, segment.width / 2.0)).length() < TOLERANCE);

    // Written out and read back, only the other tapes remain.
    let text = out.to_svg_string().unwrap();
    let reread = Document::parse(&text).unwrap();
    let relocated = Locator::from_config(&config).locate(&reread).unwrap();
    assert_eq!(relocated.rejections.len(), rejections);
    assert_eq!(relocated.segments.len(), others.len(), "{text}");
    for (found, original) in relocated.segments.iter().zip(others) {
        assert_eq!(found.path_id, original.path_id);
        assert!((found.length - original.length).abs() < TOLERANCE);
        assert!((found.width - original.width).abs() < 1e-3 + TOLERANCE);
    }
}

fn test_fixture(path: &Utf8Path) -> datatest_stable::Result<()> {
    let source = std::fs::read_to_string(path)?;
    let doc = Document::parse(&source)?;
    let located = Locator::from_config(&Config::default()).locate(&doc)?;

    assert_eq!(
        located.segments.len(),
        expected(&doc, "data-expected-tapes"),
        "{path}: tapes"
    );
    let rejections = expected(&doc, "data-expected-rejections");
    assert_eq!(located.rejections.len(), rejections, "{path}: rejections");

    for (i, segment) in located.segments.iter().enumerate() {
        assert!(segment.length > 1e-3);
        assert!(segment.width > 0.0);
        let others: Vec<_> = located
            .segments
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, s)| s)
            .collect();
        check_tape(&doc, segment, &others, rejections);
    }

    Ok(())
}

datatest_stable::harness! {
    { test = test_fixture, root = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"), pattern = r"\.svg$" },
}
