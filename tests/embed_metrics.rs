use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use mukoko_embed::infra::host_page::HostPageMounter;
use url::Url;

#[test]
fn mounting_counts_each_new_widget() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let mounter = HostPageMounter::new(
        Url::parse("https://news.mukoko.com").expect("origin"),
        "Mukoko News",
    );
    let page = concat!(
        r#"<div data-mukoko-embed data-layout="hero"></div>"#,
        r#"<div data-mukoko-embed data-layout="list"></div>"#,
        r#"<div data-mukoko-embed data-mukoko-mounted="true"></div>"#,
    );
    let report = mounter.mount_document(page).expect("rewrite");
    assert_eq!(report.mounted, 2);
    assert_eq!(report.skipped, 1);

    let mounted = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find(|(key, _, _, _)| key.key().name() == "mukoko_embed_mounted_total")
        .map(|(_, _, _, value)| value);

    assert_eq!(mounted, Some(DebugValue::Counter(2)));
}
