//! End-to-end test: extract a generated SDK archive and run its install script.

#![cfg(unix)]

use flate2::write::GzEncoder;
use flate2::Compression;
use managed_sdk::{InstallError, SdkInstallError, SdkInstallOptions, SdkInstaller};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

const INSTALL_SCRIPT: &str = r#"#!/bin/sh
echo "installing from $(pwd -P)"
echo "progress on stderr" >&2
printf '%s\n' "$@" > args.txt
exit 0
"#;

const FAILING_SCRIPT: &str = "#!/bin/sh\necho \"cannot install\" >&2\nexit 3\n";

fn write_sdk_archive(path: &Path, script: &str) {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    builder
        .append_data(&mut header, "google-cloud-sdk/", io::empty())
        .unwrap();

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    builder
        .append_data(&mut header, "google-cloud-sdk/install.sh", script.as_bytes())
        .unwrap();

    builder.into_inner().unwrap().finish().unwrap();
}

// One test function so no other test in this binary forks while a freshly
// written script is still open for writing.
#[tokio::test]
async fn test_sdk_install_end_to_end() {
    let temp = tempfile::tempdir().unwrap();
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&messages);
    let listener = Arc::new(move |text: &str| sink.lock().unwrap().push(text.to_string()));

    // Successful install
    let archive = temp.path().join("google-cloud-sdk.tar.gz");
    write_sdk_archive(&archive, INSTALL_SCRIPT);
    let root = temp.path().join("managed");
    let installer = SdkInstaller::new(&root, SdkInstallOptions::default(), listener.clone());

    let home = installer.install(&archive).await.unwrap();
    assert_eq!(home, root.join("google-cloud-sdk"));

    let args = fs::read_to_string(home.join("args.txt")).unwrap();
    assert_eq!(
        args,
        "--path-update=false\n--command-completion=false\n--quiet\n--usage-reporting=false\n"
    );

    let script = home.join("install.sh");
    {
        let messages = messages.lock().unwrap();
        assert_eq!(messages[0], format!("{}\n", home.display()));
        assert_eq!(messages[1], format!("{}\n", script.display()));
        assert_eq!(
            messages[2],
            format!(
                "Running command : {} --path-update=false --command-completion=false --quiet --usage-reporting=false\n",
                script.display()
            )
        );
        let canonical_home = home.canonicalize().unwrap();
        assert!(messages.contains(&format!("installing from {}\n", canonical_home.display())));
        assert!(messages.contains(&"progress on stderr\n".to_string()));
    }

    // Failing install
    let failing_archive = temp.path().join("failing.tgz");
    write_sdk_archive(&failing_archive, FAILING_SCRIPT);
    let failing_root = temp.path().join("failing");
    let installer =
        SdkInstaller::new(&failing_root, SdkInstallOptions::default(), listener.clone());

    match installer.install(&failing_archive).await {
        Err(SdkInstallError::Install(InstallError::NonZeroExit { exit_code })) => {
            assert_eq!(exit_code, 3);
        }
        other => panic!("expected NonZeroExit, got {:?}", other),
    }
    assert!(messages
        .lock()
        .unwrap()
        .contains(&"cannot install\n".to_string()));
}
