//! Publish pipeline against in-memory collaborators

use metabaker_core::{
    IndexBase, MetabakerConfig, PinStatus, PublishArgs, PublishOutcome, Publisher,
};
use metabaker_test_utils::{upload_json, MemoryStore, StaticChain, TestProject};
use pretty_assertions::assert_eq;
use serde_json::json;

fn args(count: &str, scaffold: bool) -> PublishArgs {
    PublishArgs {
        contract: "MyNft".to_string(),
        address: "0xABC".to_string(),
        count: count.to_string(),
        scaffold_metadata: scaffold,
    }
}

#[tokio::test]
async fn test_publish_patches_authored_metadata() {
    let project = TestProject::new();
    for i in 0..2 {
        project.write_image(i, format!("image-{i}").as_bytes());
        project.write_metadata(
            i,
            &json!({ "name": format!("Token {i}"), "image": format!("old/{i}.png"), "level": i }),
        );
    }
    let chain = StaticChain::with_supply(2);
    let store = MemoryStore::new();

    let publisher = Publisher::new(&project.config, project.root(), &chain, &store);
    let outcome = publisher.run(&args("contract", false)).await.unwrap();

    let PublishOutcome::Published(report) = outcome else {
        panic!("expected a published report");
    };
    assert_eq!(report.count.get(), 2);
    assert_eq!(report.image_cid.as_str(), MemoryStore::cid_for(0));
    assert_eq!(report.base_uri(), format!("ipfs://{}", MemoryStore::cid_for(1)));
    assert_eq!(report.image_pin, PinStatus::Pinned);
    assert_eq!(chain.supply_reads(), 1);

    let uploads = store.uploads();
    assert_eq!(uploads.len(), 2);

    let image_names: Vec<_> = uploads[0].iter().map(|f| f.name.as_str()).collect();
    assert_eq!(image_names, vec!["0.png", "1.png"]);
    assert_eq!(uploads[0][1].bytes, b"image-1");

    let meta_names: Vec<_> = uploads[1].iter().map(|f| f.name.as_str()).collect();
    assert_eq!(meta_names, vec!["0", "1"]);
    assert_eq!(
        upload_json(&uploads[1][1]),
        json!({ "name": "Token 1", "image": "ipfs://bafymemory0/1.png", "level": 1 })
    );

    assert!(!project.layout().upload_dir().exists());
}

#[tokio::test]
async fn test_publish_scaffolds_from_template() {
    let project = TestProject::new();
    project.write_template(&json!({
        "name": "Creature $TOKEN_NUMBER",
        "description": "A creature",
        "image": "placeholder.png"
    }));
    for i in 0..3 {
        project.write_image(i, b"img");
    }
    let chain = StaticChain::default();
    let store = MemoryStore::new();

    let publisher = Publisher::new(&project.config, project.root(), &chain, &store);
    publisher.run(&args("3", true)).await.unwrap();

    assert_eq!(chain.supply_reads(), 0);
    let uploads = store.uploads();
    let names: Vec<_> = uploads[1]
        .iter()
        .map(|f| upload_json(f)["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Creature #0", "Creature #1", "Creature #2"]);
    assert_eq!(upload_json(&uploads[1][0])["image"], json!("placeholder.png"));
}

#[tokio::test]
async fn test_publish_scaffold_is_byte_stable() {
    let project = TestProject::new();
    project.write_image(0, b"img");
    project.write_image(1, b"img");
    let chain = StaticChain::default();

    let first = MemoryStore::new();
    Publisher::new(&project.config, project.root(), &chain, &first)
        .run(&args("2", true))
        .await
        .unwrap();
    let second = MemoryStore::new();
    Publisher::new(&project.config, project.root(), &chain, &second)
        .run(&args("2", true))
        .await
        .unwrap();

    assert_eq!(first.uploads()[1], second.uploads()[1]);
}

#[tokio::test]
async fn test_publish_one_based_indices() {
    let config = MetabakerConfig::new()
        .with_storage_key("k")
        .with_index_base(IndexBase::One);
    let project = TestProject::with_config(config);
    project.write_image(1, b"a");
    project.write_image(2, b"b");
    let chain = StaticChain::default();
    let store = MemoryStore::new();

    Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("2", true))
        .await
        .unwrap();

    let uploads = store.uploads();
    let names: Vec<_> = uploads[0].iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["1.png", "2.png"]);
    assert_eq!(upload_json(&uploads[1][0])["name"], json!("nft name template token number #1"));
}

#[tokio::test]
async fn test_publish_requires_storage_key() {
    let project = TestProject::with_config(MetabakerConfig::new());
    let chain = StaticChain::with_supply(1);
    let store = MemoryStore::new();

    let err = Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("contract", false))
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert_eq!(chain.supply_reads(), 0);
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_publish_rejects_zero_supply() {
    let project = TestProject::new();
    let chain = StaticChain::with_supply(0);
    let store = MemoryStore::new();

    let err = Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("contract", false))
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_publish_missing_image_aborts_before_upload() {
    let project = TestProject::new();
    project.write_image(0, b"only one");
    let chain = StaticChain::default();
    let store = MemoryStore::new();

    let err = Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("2", true))
        .await
        .unwrap_err();

    assert!(err.is_missing_record());
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_publish_missing_metadata_aborts_after_image_upload() {
    let project = TestProject::new();
    project.write_image(0, b"a");
    project.write_image(1, b"b");
    project.write_metadata(0, &json!({ "image": "0.png" }));
    let chain = StaticChain::default();
    let store = MemoryStore::new();

    let err = Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("2", false))
        .await
        .unwrap_err();

    assert!(err.is_missing_record());
    assert_eq!(store.uploads().len(), 1);
    // Staged files stay behind for inspection
    assert!(project.layout().upload_dir().join("0.png").exists());
}

#[tokio::test]
async fn test_publish_upload_failure_propagates() {
    let project = TestProject::new();
    project.write_image(0, b"a");
    let chain = StaticChain::default();
    let store = MemoryStore::failing();

    let err = Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("1", true))
        .await
        .unwrap_err();

    assert!(err.is_external());
}

#[tokio::test]
async fn test_publish_clears_stale_staging() {
    let project = TestProject::new();
    project.write_image(0, b"a");
    let upload = project.layout().reset_staging().unwrap();
    std::fs::write(upload.join("9.json"), b"{}").unwrap();
    std::fs::write(upload.join("9.png"), b"stale").unwrap();
    let chain = StaticChain::default();
    let store = MemoryStore::new();

    Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("1", true))
        .await
        .unwrap();

    let uploads = store.uploads();
    assert_eq!(uploads[0].len(), 1);
    assert_eq!(uploads[1].len(), 1);
}

#[tokio::test]
async fn test_publish_rejects_unknown_contract() {
    let project = TestProject::new();
    project.write_image(0, b"a");
    let chain = StaticChain::with_supply(1).with_artifact("MyNft");
    let store = MemoryStore::new();

    let mut unknown = args("1", true);
    unknown.contract = "NoSuchContract".to_string();
    let err = Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&unknown)
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("NoSuchContract"));
    assert!(store.uploads().is_empty());
    assert!(!project.layout().upload_dir().exists());

    Publisher::new(&project.config, project.root(), &chain, &store)
        .run(&args("1", true))
        .await
        .unwrap();
    assert_eq!(store.uploads().len(), 2);
}
