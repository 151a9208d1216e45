//! Dictionary staging scenarios against in-memory collaborators.

mod common;

use std::path::{Path, PathBuf};

use common::DOCUMENTS;
use tagcore::{
    DictionaryId, DictionaryStager, DirectoryBundle, FsOperation, StagerConfig, TagcoreError,
    DICTIONARY_FILES,
};
use tagcore_memory::{FsCall, InMemoryBundle, InMemoryFilesystem};

fn ipadic() -> DictionaryId {
    DictionaryId::try_new("ipadic").unwrap()
}

fn asset_stager(
    filesystem: &InMemoryFilesystem,
    bundle: &InMemoryBundle,
) -> DictionaryStager<InMemoryBundle, InMemoryFilesystem> {
    DictionaryStager::new(
        bundle.clone(),
        filesystem.clone(),
        StagerConfig::asset_bundle(DOCUMENTS),
    )
}

/// A plain-directory bundle under `/bundle` sharing the writable filesystem.
fn directory_fixture() -> (
    InMemoryFilesystem,
    DictionaryStager<DirectoryBundle<InMemoryFilesystem>, InMemoryFilesystem>,
) {
    let filesystem = InMemoryFilesystem::new();
    for file_name in DICTIONARY_FILES {
        filesystem.insert_file(
            Path::new("/bundle/ipadic").join(file_name),
            format!("bundled {file_name}"),
        );
    }
    let stager = DictionaryStager::new(
        DirectoryBundle::new(filesystem.clone(), "/bundle"),
        filesystem.clone(),
        StagerConfig::directory_bundle(DOCUMENTS),
    );
    (filesystem, stager)
}

#[tokio::test]
async fn copies_every_manifest_file_into_the_documents_dir() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");

    let staged = asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap();

    assert_eq!(staged, PathBuf::from("/documents/ipadic"));
    assert!(filesystem.has_dir("/documents/ipadic"));

    let expected: Vec<_> = DICTIONARY_FILES
        .iter()
        .map(|name| (format!("ipadic/{name}"), staged.join(name)))
        .collect();
    assert_eq!(bundle.copies(), expected);

    for name in DICTIONARY_FILES {
        assert_eq!(
            filesystem.read_file(staged.join(name)),
            Some(format!("ipadic:{name}").into_bytes())
        );
    }
}

#[tokio::test]
async fn creates_the_staging_directory_once() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");

    asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap();

    let mkdirs: Vec<_> = filesystem
        .calls()
        .into_iter()
        .filter(|call| matches!(call, FsCall::CreateDir(_)))
        .collect();
    assert_eq!(mkdirs, [FsCall::CreateDir(PathBuf::from("/documents/ipadic"))]);
}

#[tokio::test]
async fn missing_dictionary_root_is_not_found() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "unidic");

    let error = asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap_err();

    assert_eq!(error, TagcoreError::NotFound("ipadic".to_string()));
    assert_eq!(
        error.to_string(),
        "Path \"ipadic\" was not found in the dictionary bundle."
    );
    assert!(filesystem.calls().is_empty());
    assert!(bundle.copies().is_empty());
}

#[tokio::test]
async fn each_missing_file_is_reported_while_the_rest_are_copied() {
    for missing in DICTIONARY_FILES {
        let filesystem = InMemoryFilesystem::new();
        let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");
        bundle.remove(&format!("ipadic/{missing}"));

        let error = asset_stager(&filesystem, &bundle)
            .stage(&ipadic())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            TagcoreError::IncompleteManifest {
                missing: vec![missing.to_string()],
            }
        );
        assert_eq!(
            error.to_string(),
            format!(
                "Invalid contents of the dictionary directory. \
                 The following files are missing: \"{missing}\"."
            )
        );

        for name in DICTIONARY_FILES.iter().filter(|name| **name != missing) {
            assert!(
                filesystem.read_file(Path::new("/documents/ipadic").join(name)).is_some(),
                "{name} should be staged when only {missing} is missing"
            );
        }
        assert!(filesystem.writes().is_empty(), "no runtime config after a failed stage");
    }
}

#[tokio::test]
async fn all_missing_files_are_listed_in_manifest_order() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");
    bundle.remove("ipadic/unk.dic");
    bundle.remove("ipadic/char.bin");
    bundle.remove("ipadic/matrix.bin");

    let error = asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Invalid contents of the dictionary directory. The following files are missing: \
         \"char.bin\", \"matrix.bin\", \"unk.dic\"."
    );
    assert_eq!(bundle.copies().len(), DICTIONARY_FILES.len() - 3);
}

#[tokio::test]
async fn writes_an_empty_runtime_config_when_absent() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");

    asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap();

    assert_eq!(
        filesystem.writes(),
        [PathBuf::from("/documents/ipadic/mecabrc")]
    );
    assert_eq!(
        filesystem.read_file("/documents/ipadic/mecabrc"),
        Some(Vec::new())
    );
}

#[tokio::test]
async fn never_overwrites_an_existing_runtime_config() {
    let filesystem =
        InMemoryFilesystem::new().with_file("/documents/ipadic/mecabrc", "cost-factor = 700");
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");

    asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap();

    assert!(filesystem.writes().is_empty());
    assert_eq!(
        filesystem.read_file("/documents/ipadic/mecabrc"),
        Some(b"cost-factor = 700".to_vec())
    );
}

#[tokio::test]
async fn runtime_config_failures_are_surfaced_verbatim() {
    for operation in [FsOperation::Exists, FsOperation::Write] {
        let filesystem = InMemoryFilesystem::new();
        let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");
        filesystem.fail_on(operation, "/documents/ipadic/mecabrc", "Input/output error");

        let error = asset_stager(&filesystem, &bundle)
            .stage(&ipadic())
            .await
            .unwrap_err();

        assert!(
            matches!(&error, TagcoreError::Filesystem(e) if e.operation == operation),
            "{error:?}"
        );
        assert_eq!(error.to_string(), "Input/output error");
        assert_eq!(bundle.copies().len(), DICTIONARY_FILES.len());
    }
}

#[tokio::test]
async fn directory_creation_failures_are_surfaced_verbatim() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");
    filesystem.fail_on(
        FsOperation::CreateDir,
        "/documents/ipadic",
        "Read-only file system",
    );

    let error = asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap_err();

    assert!(matches!(&error, TagcoreError::Filesystem(e) if e.operation == FsOperation::CreateDir));
    assert_eq!(error.to_string(), "Read-only file system");
    assert!(bundle.copies().is_empty());
}

#[tokio::test]
async fn asset_copy_failures_are_fatal() {
    let filesystem = InMemoryFilesystem::new();
    let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");
    bundle.fail_copy("ipadic/matrix.bin", "asset stream closed");

    let error = asset_stager(&filesystem, &bundle)
        .stage(&ipadic())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "asset stream closed");
    let last_copy = bundle.copies().pop().unwrap();
    assert_eq!(last_copy.0, "ipadic/matrix.bin");
}

#[tokio::test]
async fn directory_bundles_copy_plain_files() {
    let (filesystem, stager) = directory_fixture();

    let staged = stager.stage(&ipadic()).await.unwrap();

    for name in DICTIONARY_FILES {
        assert_eq!(
            filesystem.read_file(staged.join(name)),
            Some(format!("bundled {name}").into_bytes())
        );
    }
    assert!(filesystem.calls().contains(&FsCall::CopyFile(
        PathBuf::from("/bundle/ipadic/sys.dic"),
        PathBuf::from("/documents/ipadic/sys.dic"),
    )));
}

#[tokio::test]
async fn directory_bundles_replace_previously_staged_files() {
    let (filesystem, stager) = directory_fixture();
    filesystem.insert_file("/documents/ipadic/sys.dic", "stale");

    stager.stage(&ipadic()).await.unwrap();

    let calls = filesystem.calls();
    let removal = calls
        .iter()
        .position(|call| *call == FsCall::RemoveFile(PathBuf::from("/documents/ipadic/sys.dic")))
        .expect("stale file removed");
    let copy = calls
        .iter()
        .position(|call| {
            *call
                == FsCall::CopyFile(
                    PathBuf::from("/bundle/ipadic/sys.dic"),
                    PathBuf::from("/documents/ipadic/sys.dic"),
                )
        })
        .expect("file copied");
    assert!(removal < copy);
    assert_eq!(
        filesystem.read_file("/documents/ipadic/sys.dic"),
        Some(b"bundled sys.dic".to_vec())
    );
}

#[tokio::test]
#[tracing_test::traced_test]
async fn directory_bundle_copy_failures_only_warn() {
    let (filesystem, stager) = directory_fixture();
    filesystem.fail_on(
        FsOperation::Copy,
        "/documents/ipadic/sys.dic",
        "file is being copied by another stager",
    );

    let staged = stager.stage(&ipadic()).await.unwrap();

    assert_eq!(staged, PathBuf::from("/documents/ipadic"));
    assert!(filesystem.read_file("/documents/ipadic/sys.dic").is_none());
    assert!(filesystem.read_file("/documents/ipadic/unk.dic").is_some());
    assert!(logs_contain("Failed to copy dictionary file, continuing"));
}

#[tokio::test]
async fn directory_bundles_report_a_missing_root() {
    let (_, stager) = directory_fixture();

    let error = stager
        .stage(&DictionaryId::try_new("unidic").unwrap())
        .await
        .unwrap_err();

    assert_eq!(error, TagcoreError::NotFound("unidic".to_string()));
}
