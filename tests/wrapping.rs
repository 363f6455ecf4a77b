use cvpress::{FontMetrics, FontWeight, wrap_text};

const SAMPLE: &str = "The Analytical Engine weaves algebraical patterns just as the Jacquard \
                      loom weaves flowers and leaves, and it might act upon other things besides number.";

#[test]
fn empty_text_has_no_lines() {
    let font = FontMetrics::helvetica(FontWeight::Regular);
    assert!(wrap_text("", &font, 11.0, 200.0).is_empty());
    assert!(wrap_text("  \t \n ", &font, 11.0, 200.0).is_empty());
}

#[test]
fn lines_never_exceed_the_limit() {
    let font = FontMetrics::helvetica(FontWeight::Regular);
    for max_width in [60.0, 120.0, 250.0, 480.0] {
        let lines = wrap_text(SAMPLE, &font, 11.0, max_width);
        assert!(lines.len() > 1 || max_width >= font.text_width(SAMPLE, 11.0));
        for line in &lines {
            let width = font.text_width(line, 11.0);
            assert!(
                width <= max_width || !line.contains(' '),
                "'{line}' is {width:.1}pt wide, limit {max_width}"
            );
        }
    }
}

#[test]
fn wrapping_keeps_every_word_in_order() {
    let font = FontMetrics::helvetica(FontWeight::Bold);
    let lines = wrap_text(SAMPLE, &font, 14.0, 150.0);
    let rejoined = lines.join(" ");
    let expected: Vec<&str> = SAMPLE.split_whitespace().collect();
    assert_eq!(rejoined.split(' ').collect::<Vec<_>>(), expected);
}

#[test]
fn oversized_word_sits_alone() {
    let font = FontMetrics::helvetica(FontWeight::Regular);
    let long = "Supercalifragilisticexpialidocious";
    let lines = wrap_text(&format!("a {long} b"), &font, 11.0, 40.0);
    assert_eq!(lines, vec!["a".to_string(), long.to_string(), "b".to_string()]);
}

#[test]
fn whitespace_runs_collapse() {
    let font = FontMetrics::helvetica(FontWeight::Regular);
    let lines = wrap_text("C++,   Assembly\n", &font, 11.0, 500.0);
    assert_eq!(lines, vec!["C++, Assembly".to_string()]);
}

#[test]
fn helvetica_widths_match_afm() {
    let regular = FontMetrics::helvetica(FontWeight::Regular);
    let bold = FontMetrics::helvetica(FontWeight::Bold);
    // AFM: space 278, 'A' 667 regular / 722 bold
    assert!((regular.space_width(10.0) - 2.78).abs() < 1e-4);
    assert!((regular.text_width("A", 10.0) - 6.67).abs() < 1e-4);
    assert!((bold.text_width("A", 10.0) - 7.22).abs() < 1e-4);
    assert!(bold.text_width(SAMPLE, 11.0) > regular.text_width(SAMPLE, 11.0));
}
