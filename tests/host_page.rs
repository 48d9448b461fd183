use mukoko_embed::infra::host_page::HostPageMounter;
use url::Url;

fn mounter() -> HostPageMounter {
    HostPageMounter::new(
        Url::parse("https://news.mukoko.com").expect("origin"),
        "Mukoko News",
    )
}

fn iframe_count(html: &str) -> usize {
    html.matches("<iframe").count()
}

#[test]
fn remounting_a_processed_document_adds_nothing() {
    let page = r#"<main><div data-mukoko-embed data-country="KE" data-type="top"></div></main>"#;

    let first = mounter().mount_document(page).expect("first pass");
    assert_eq!(first.mounted, 1);
    assert_eq!(iframe_count(&first.html), 1);

    let second = mounter().mount_document(&first.html).expect("second pass");
    assert_eq!(second.mounted, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(iframe_count(&second.html), 1);
    assert_eq!(second.html, first.html);
}

#[test]
fn every_placeholder_gets_its_own_sandboxed_frame() {
    let page = concat!(
        r#"<div data-mukoko-embed data-country="KE" data-type="top"></div>"#,
        r#"<section data-mukoko-embed data-layout="ticker"></section>"#,
        r#"<div class="unrelated"></div>"#,
    );

    let report = mounter().mount_document(page).expect("rewrite");
    assert_eq!(report.mounted, 2);
    assert_eq!(iframe_count(&report.html), 2);
    assert!(report.html.contains(r#"title="KE Top Stories — Mukoko News""#));
    assert!(
        report
            .html
            .contains(r#"sandbox="allow-scripts allow-popups allow-popups-to-escape-sandbox""#)
    );
    assert!(!report.html.contains("allow-same-origin"));
    assert!(report.html.contains(r#"loading="lazy""#));
    assert!(report.html.contains(r#"<div class="unrelated"></div>"#));
}

#[test]
fn script_base_url_overrides_the_origin() {
    let page = concat!(
        r#"<script src="/embed.js" data-base-url="https://staging.mukoko.test"></script>"#,
        r#"<div data-mukoko-embed data-country="ke"></div>"#,
    );

    let report = mounter().mount_document(page).expect("rewrite");
    assert!(
        report
            .html
            .contains(r#"src="https://staging.mukoko.test/embed/iframe?country=KE"#)
    );
}

#[test]
fn malformed_base_url_falls_back_to_the_default() {
    let page = concat!(
        r#"<script data-base-url="not a url"></script>"#,
        r#"<div data-mukoko-embed></div>"#,
    );

    let report = mounter().mount_document(page).expect("rewrite");
    assert!(
        report
            .html
            .contains(r#"src="https://news.mukoko.com/embed/iframe?country=ZW"#)
    );
}

#[test]
fn documents_without_placeholders_are_returned_verbatim() {
    let page = "<!doctype html><html><body><p data-country=KE>Hi</p></body></html>";
    let report = mounter().mount_document(page).expect("rewrite");
    assert_eq!(report.html, page);
    assert_eq!(report.mounted + report.skipped + report.failed, 0);
}
