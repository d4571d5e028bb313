use super::*;
use time::macros::datetime;

#[test]
fn dates_render_as_calendar_days() {
    assert_eq!(format_date(datetime!(2024-05-01 23:59 UTC)), "2024-05-01");
}

#[test]
fn timestamps_are_shown_in_utc() {
    let ts = datetime!(2024-05-01 23:30 -02:00);
    assert_eq!(format_timestamp(ts), "2024-05-02 01:30 UTC");
}

#[test]
fn render_produces_html() {
    let html = render(|| view! { <p class="x">"hi"</p> });
    assert!(html.contains(r#"<p class="x">hi</p>"#), "{html}");
}
