use serde_json::json;

use super::*;
use crate::cheer::CheermoteCatalog;
use crate::metadata::{CheermoteDefinition, CheermoteTierData};

fn cheer_catalog() -> CheermoteCatalog {
    let tiers = [(1, "#979797"), (100, "#9c3ee8"), (1000, "#1db2a5")]
        .into_iter()
        .map(|(min_bits, color)| CheermoteTierData {
            min_bits,
            color: Some(color.into()),
            image_url: Some(format!("https://example.com/cheer/{min_bits}.gif")),
        })
        .collect();
    CheermoteCatalog::build(&[CheermoteDefinition {
        prefix: "cheer".into(),
        tiers,
    }])
    .unwrap()
}

fn texts(message: &AnnotatedMessage) -> Vec<(&str, Option<&str>)> {
    message
        .iter()
        .map(|s| (s.text.as_str(), s.annotation.as_ref().map(|a| a.id.as_str())))
        .collect()
}

/// Segments tile `[0, len)` in order and reproduce the message.
fn assert_partition(message: &str, annotated: &AnnotatedMessage) {
    assert_eq!(annotated.raw_text(), message);
    let total: usize = annotated.iter().map(|s| s.text.len()).sum();
    assert_eq!(total, message.len());
    for segment in annotated.iter().filter(|s| s.is_plain()) {
        if annotated.len() > 1 {
            assert!(!segment.text.is_empty());
        }
    }
}

#[test]
fn test_parse_emote_spec() {
    let offsets = parse_emote_spec("25:0-4,6-10/1902:12-14").unwrap();
    assert_eq!(
        offsets,
        vec![
            EmoteOffset {
                id: "25".into(),
                start: 0,
                end: 4,
            },
            EmoteOffset {
                id: "25".into(),
                start: 6,
                end: 10,
            },
            EmoteOffset {
                id: "1902".into(),
                start: 12,
                end: 14,
            },
        ]
    );
    assert!(parse_emote_spec("").unwrap().is_empty());
}

#[test]
fn test_parse_emote_spec_rejects_garbage() {
    for spec in [
        "25",
        "25:0",
        "25:a-4",
        "25:0-4,x-1",
        ":0-4",
        "25:0-99999999999999999999999",
    ] {
        assert!(
            matches!(
                parse_emote_spec(spec),
                Err(crate::TwitchError::InvalidEmoteSpec(_))
            ),
            "{spec} should be rejected"
        );
    }
}

#[test]
fn test_explicit_emote_merge() {
    let message = "Kappa Kappa LUL!!";
    let annotated = SegmentBuilder::new(None).annotate(message, Some("25:0-4,6-10/1902:12-14"));

    assert_eq!(
        texts(&annotated),
        vec![
            ("Kappa", Some("25")),
            (" ", None),
            ("Kappa", Some("25")),
            (" ", None),
            ("LUL", Some("1902")),
            ("!!", None),
        ]
    );
    assert_partition(message, &annotated);
    assert_eq!(annotated.to_string(), "<Kappa:25> <Kappa:25> <LUL:1902>!!");
}

#[test]
fn test_no_annotations_is_single_plain_segment() {
    let annotated = SegmentBuilder::new(None).annotate("just text", None);
    assert_eq!(texts(&annotated), vec![("just text", None)]);

    let empty = SegmentBuilder::new(None).annotate("", Some(""));
    assert_eq!(empty.len(), 1);
    assert_eq!(empty.raw_text(), "");
    assert_eq!(serde_json::to_value(&empty).unwrap(), json!([]));
}

#[test]
fn test_cheers_resolve_to_tiers() {
    let catalog = cheer_catalog();
    let message = "Hi cheer100 and cheer99 GG";
    let annotated = SegmentBuilder::new(Some(&catalog)).annotate(message, None);

    assert_eq!(
        texts(&annotated),
        vec![
            ("Hi ", None),
            ("cheer100", Some("cheer100")),
            (" and ", None),
            ("cheer99", Some("cheer1")),
            (" GG", None),
        ]
    );
    assert_partition(message, &annotated);
    assert_eq!(annotated.total_bits(), 199);
    assert_eq!(
        annotated.to_string(),
        "Hi <cheer100:cheer100*100 #9c3ee8> and <cheer99:cheer1*99 #979797> GG"
    );
}

#[test]
fn test_emotes_and_cheers_interleave() {
    let catalog = cheer_catalog();
    let message = "cheer1000 Kappa";
    let annotated = SegmentBuilder::new(Some(&catalog)).annotate(message, Some("25:10-14"));
    assert_eq!(
        texts(&annotated),
        vec![
            ("cheer1000", Some("cheer1000")),
            (" ", None),
            ("Kappa", Some("25")),
        ]
    );
    assert!(annotated.segments()[0].is_cheer());
    assert!(!annotated.segments()[2].is_cheer());
}

#[test]
fn test_zero_bit_cheer_is_still_a_cheer() {
    let catalog = cheer_catalog();
    let message = "cheer0 hi";
    let annotated = SegmentBuilder::new(Some(&catalog)).annotate(message, None);

    let cheer = &annotated.segments()[0];
    assert_eq!(cheer.text, "cheer0");
    assert!(cheer.is_cheer());
    assert_partition(message, &annotated);
    assert_eq!(annotated.total_bits(), 0);
    assert_eq!(annotated.to_string(), "<cheer0:cheer1 #979797> hi");

    let value = serde_json::to_value(&annotated).unwrap();
    assert_eq!(
        value,
        json!([{"emote": "cheer1", "name": "cheer0", "bits_color": "#979797"}, " hi"])
    );
    let back: AnnotatedMessage = serde_json::from_value(value).unwrap();
    assert_eq!(back, annotated);
    assert!(back.segments()[0].is_cheer());
}

#[test]
fn test_explicit_emote_wins_tie_with_cheer() {
    let catalog = cheer_catalog();
    let message = "cheer100 yes";
    let annotated = SegmentBuilder::new(Some(&catalog)).annotate(message, Some("777:0-7"));
    assert_eq!(texts(&annotated), vec![("cheer100", Some("777")), (" yes", None)]);
    assert_eq!(annotated.total_bits(), 0);
}

#[test]
fn test_overlap_keeps_first_location() {
    let catalog = cheer_catalog();
    let builder = SegmentBuilder::new(Some(&catalog));

    let message = "cheer1 hi";
    let annotated = builder.annotate(message, Some("E:0-2"));
    assert_eq!(texts(&annotated), vec![("che", Some("E")), ("er1 hi", None)]);
    assert_partition(message, &annotated);

    let message = "a cheer1";
    let annotated = builder.annotate(message, Some("E:4-6"));
    assert_eq!(texts(&annotated), vec![("a ", None), ("cheer1", Some("cheer1"))]);
    assert_partition(message, &annotated);
}

#[test]
fn test_malformed_spec_falls_back_to_cheers_only() {
    let catalog = cheer_catalog();
    let message = "Kappa cheer5";
    let annotated = SegmentBuilder::new(Some(&catalog)).annotate(message, Some("25:0-x"));
    assert_eq!(
        texts(&annotated),
        vec![("Kappa ", None), ("cheer5", Some("cheer1"))]
    );
    assert_partition(message, &annotated);
}

#[test]
fn test_out_of_range_offsets_are_discarded() {
    let builder = SegmentBuilder::new(None);

    let message = "short";
    let annotated = builder.annotate(message, Some("25:0-4/30:3-40"));
    assert_eq!(texts(&annotated), vec![("short", None)]);

    // Offset 1 splits the two-byte 'é'.
    let message = "é Kappa";
    let annotated = builder.annotate(message, Some("25:1-2"));
    assert_eq!(texts(&annotated), vec![("é Kappa", None)]);

    let annotated = builder.annotate(message, Some("25:3-7"));
    assert_eq!(texts(&annotated), vec![("é ", None), ("Kappa", Some("25"))]);
}

#[test]
fn test_lossless_on_assorted_inputs() {
    let catalog = cheer_catalog();
    let builder = SegmentBuilder::new(Some(&catalog));
    let cases = [
        ("", None),
        ("cheer1", None),
        ("cheer1cheer1 cheer1", None),
        ("Kappa", Some("25:0-4")),
        ("Kappa Kappa", Some("25:6-10/25:0-4")),
        ("日本語 cheer10 ok", Some("1:10-16")),
        ("xx cheer100", Some("1:0-0,1-1")),
        ("spec too long", Some("1:0-100")),
    ];
    for (message, spec) in cases {
        let annotated = builder.annotate(message, spec);
        assert_partition(message, &annotated);
    }
}

#[test]
fn test_structured_form() {
    let catalog = cheer_catalog();
    let annotated =
        SegmentBuilder::new(Some(&catalog)).annotate("Hi Kappa cheer100", Some("25:3-7"));

    let value = serde_json::to_value(&annotated).unwrap();
    assert_eq!(
        value,
        json!([
            "Hi ",
            {"emote": "25", "name": "Kappa"},
            " ",
            {"emote": "cheer100", "name": "cheer100", "bits": 100, "bits_color": "#9c3ee8"}
        ])
    );

    let back: AnnotatedMessage = serde_json::from_value(value).unwrap();
    assert_eq!(back, annotated);
}

#[test]
fn test_render_omits_empty_fields() {
    let message = AnnotatedMessage::new(vec![
        Segment::plain("a "),
        Segment::annotated(
            "",
            Annotation {
                id: "42".into(),
                label: None,
                bits: 0,
                bits_color: String::new(),
            },
        ),
    ]);
    assert_eq!(message.to_string(), "a <42>");
}

#[test]
fn test_annotation_without_text_is_rejected() {
    let missing = serde_json::from_value::<AnnotatedMessage>(json!(["a ", {"emote": "25"}]));
    assert!(missing.unwrap_err().to_string().contains("name"));

    let empty = serde_json::from_value::<AnnotatedMessage>(json!([{"emote": "25", "name": ""}]));
    assert!(empty.is_err());
}
