//! Integration tests for the encryption and decryption engines.
//!
//! Passwords come from `ScriptedPrompt`, hashes live in a
//! `MemoryHashStore`, and backoff sleeps are recorded instead of slept.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use tarseal::crypto::{sha256_hex, HEADER_LEN, MIN_FRAME_LEN, NONCE_LEN, SALT_LEN};
use tarseal::engine::{
    decrypted_path_for, encrypted_path_for, DecryptionEngine, EncryptionEngine, IntegrityStatus,
    RetryPolicy,
};
use tarseal::errors::TarSealError;
use tarseal::metadata::{HashStore, JsonHashStore, MemoryHashStore};
use tarseal::secret::ScriptedPrompt;
use tempfile::TempDir;

/// Helper: write `content` to `<tmp>/<name>`.
fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write input");
    path
}

/// Helper: encrypt `path` with `password` (entered twice).
fn encrypt_with(path: &Path, password: &str, store: &mut MemoryHashStore) -> PathBuf {
    let mut engine = EncryptionEngine::new(ScriptedPrompt::new([password, password]), store);
    engine.try_encrypt(path).expect("encrypt")
}

/// Helper: a decryption engine that records backoff delays.
fn decryptor<'a>(
    answers: &[&str],
    store: &'a mut MemoryHashStore,
) -> (
    DecryptionEngine<ScriptedPrompt, &'a mut MemoryHashStore>,
    Rc<RefCell<Vec<Duration>>>,
) {
    let sleeps = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&sleeps);
    let engine = DecryptionEngine::new(ScriptedPrompt::new(answers.iter().copied()), store)
        .with_sleeper(move |d| recorded.borrow_mut().push(d));
    (engine, sleeps)
}

/// Helper: names of every entry in a directory, sorted.
fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn hello_world_roundtrip_with_integrity_check() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "backup.tar.xz", b"hello world");
    let mut store = MemoryHashStore::new();

    let enc = encrypt_with(&input, "correct-horse", &mut store);
    assert_eq!(enc, dir.path().join("backup.tar.xz.enc"));
    assert_eq!(fs::metadata(&enc).unwrap().len(), 55);

    // The original's hash and the encrypted file's hash are recorded.
    assert_eq!(
        store.read_stored_hash("backup.tar.xz").unwrap(),
        Some(sha256_hex(b"hello world"))
    );
    assert_eq!(
        store.read_stored_hash("backup.tar.xz.enc").unwrap(),
        Some(sha256_hex(&fs::read(&enc).unwrap()))
    );

    let (mut engine, sleeps) = decryptor(&["correct-horse"], &mut store);
    let report = engine.try_decrypt(&enc).expect("decrypt");

    assert_eq!(report.output, dir.path().join("backup.tar.xz-decrypted"));
    assert_eq!(report.attempts, 1);
    assert_eq!(report.integrity, IntegrityStatus::Verified);
    assert_eq!(fs::read(&report.output).unwrap(), b"hello world");
    assert!(sleeps.borrow().is_empty());

    // The decrypted file's hash is recorded under its own name.
    drop(engine);
    assert_eq!(
        store.read_stored_hash("backup.tar.xz-decrypted").unwrap(),
        Some(sha256_hex(b"hello world"))
    );
}

#[test]
fn binary_content_roundtrips_exactly() {
    let dir = TempDir::new().unwrap();
    let content: Vec<u8> = (0..100_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let input = write_file(&dir, "data.bin", &content);
    let mut store = MemoryHashStore::new();

    let enc = encrypt_with(&input, "p@ss wörd", &mut store);
    let (mut engine, _) = decryptor(&["p@ss wörd"], &mut store);
    assert!(engine.decrypt(&enc));

    assert_eq!(fs::read(decrypted_path_for(&enc)).unwrap(), content);
}

#[test]
fn same_content_encrypts_differently_each_time() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"identical content");
    let mut store = MemoryHashStore::new();

    let first = encrypt_with(&input, "pw", &mut store);
    let first_copy = dir.path().join("first.enc");
    fs::rename(&first, &first_copy).unwrap();
    let second = encrypt_with(&input, "pw", &mut store);

    let a = fs::read(&first_copy).unwrap();
    let b = fs::read(&second).unwrap();
    assert_ne!(a[..SALT_LEN], b[..SALT_LEN], "salt must differ");
    assert_ne!(a[SALT_LEN..HEADER_LEN], b[SALT_LEN..HEADER_LEN], "nonce must differ");
    assert_eq!(HEADER_LEN, SALT_LEN + NONCE_LEN);

    for enc in [&first_copy, &second] {
        let (mut engine, _) = decryptor(&["pw"], &mut store);
        let report = engine.try_decrypt(enc).expect("decrypt");
        assert_eq!(fs::read(&report.output).unwrap(), b"identical content");
    }
}

// ---------------------------------------------------------------------------
// Encryption failures
// ---------------------------------------------------------------------------

#[test]
fn empty_file_is_rejected_without_prompting() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "empty.tar", b"");
    let mut store = MemoryHashStore::new();

    let mut engine = EncryptionEngine::new(ScriptedPrompt::new(["pw", "pw"]), &mut store);
    let err = engine.try_encrypt(&input).unwrap_err();

    assert!(matches!(err, TarSealError::InvalidInput(_)));
    assert!(engine.prompt().prompts().is_empty());
    assert!(!encrypted_path_for(&input).exists());
    assert!(!engine.encrypt(&input));
}

#[test]
fn missing_file_and_directory_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryHashStore::new();
    let mut engine = EncryptionEngine::new(ScriptedPrompt::default(), &mut store);

    assert!(!engine.encrypt(&dir.path().join("missing.tar")));
    assert!(!engine.encrypt(dir.path()));
    assert!(dir_entries(&dir).is_empty());
}

#[test]
fn confirmation_mismatch_creates_no_output() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"content");
    let mut store = MemoryHashStore::new();

    let mut engine = EncryptionEngine::new(ScriptedPrompt::new(["one", "two"]), &mut store);
    let err = engine.try_encrypt(&input).unwrap_err();

    assert!(matches!(err, TarSealError::ConfirmationMismatch));
    assert_eq!(dir_entries(&dir), ["a.tar"]);
    drop(engine);
    assert!(store.is_empty());
}

#[test]
fn empty_password_aborts_encryption() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"content");
    let mut store = MemoryHashStore::new();

    let mut engine = EncryptionEngine::new(ScriptedPrompt::new([""]), &mut store);
    assert!(matches!(
        engine.try_encrypt(&input),
        Err(TarSealError::EmptyPassword)
    ));
    assert!(!encrypted_path_for(&input).exists());
}

// ---------------------------------------------------------------------------
// Decryption: retries and failures
// ---------------------------------------------------------------------------

#[test]
fn three_wrong_passwords_exhaust_attempts_with_backoff() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"secret archive");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "right", &mut store);

    let (mut engine, sleeps) = decryptor(&["wrong-1", "wrong-2", "wrong-3", "right"], &mut store);
    let err = engine.try_decrypt(&enc).unwrap_err();

    assert!(matches!(err, TarSealError::MaxAttemptsExceeded(3)));
    assert_eq!(
        *sleeps.borrow(),
        [Duration::from_secs(1), Duration::from_secs(2)]
    );
    // Exactly three prompts; the fourth answer is never asked for.
    assert_eq!(engine.prompt().prompts().len(), 3);
    assert_eq!(engine.prompt().remaining(), 1);
    assert!(!decrypted_path_for(&enc).exists());
}

#[test]
fn correct_password_on_second_attempt_succeeds() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "right", &mut store);

    let (mut engine, sleeps) = decryptor(&["wrong", "right"], &mut store);
    let report = engine.try_decrypt(&enc).expect("decrypt");

    assert_eq!(report.attempts, 2);
    assert_eq!(*sleeps.borrow(), [Duration::from_secs(1)]);
    assert_eq!(fs::read(&report.output).unwrap(), b"archive");
}

#[test]
fn empty_password_aborts_without_using_an_attempt() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "right", &mut store);

    let (mut engine, sleeps) = decryptor(&["wrong", "", "right"], &mut store);
    let err = engine.try_decrypt(&enc).unwrap_err();

    assert!(matches!(err, TarSealError::EmptyPassword));
    assert_eq!(*sleeps.borrow(), [Duration::from_secs(1)]);
    assert_eq!(engine.prompt().prompts().len(), 2);
    assert!(!decrypted_path_for(&enc).exists());
}

#[test]
fn cancel_at_first_prompt_aborts() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "right", &mut store);

    let (mut engine, sleeps) = decryptor(&[], &mut store);
    assert!(matches!(
        engine.try_decrypt(&enc),
        Err(TarSealError::UserCancelled)
    ));
    assert!(sleeps.borrow().is_empty());
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive contents");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "pw", &mut store);
    let original = fs::read(&enc).unwrap();

    for index in [HEADER_LEN, original.len() - 1] {
        let mut tampered = original.clone();
        tampered[index] ^= 0x80;
        fs::write(&enc, &tampered).unwrap();

        let (engine, _) = decryptor(&["pw"], &mut store);
        let mut engine = engine.with_retry_policy(RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        });
        let err = engine.try_decrypt(&enc).unwrap_err();

        assert!(matches!(err, TarSealError::MaxAttemptsExceeded(1)));
        assert!(!decrypted_path_for(&enc).exists());
    }
}

#[test]
fn truncated_file_is_corrupt_without_prompting() {
    let dir = TempDir::new().unwrap();
    let enc = write_file(&dir, "short.tar.enc", &[0xAB; 43]);
    let mut store = MemoryHashStore::new();

    let (mut engine, sleeps) = decryptor(&["pw"], &mut store);
    let err = engine.try_decrypt(&enc).unwrap_err();

    assert!(matches!(err, TarSealError::Corrupt(_)));
    assert!(engine.prompt().prompts().is_empty());
    assert!(sleeps.borrow().is_empty());
    assert!(!engine.decrypt(&enc));
}

#[test]
fn every_undersized_file_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryHashStore::new();

    for len in [0, 1, HEADER_LEN, MIN_FRAME_LEN - 1] {
        let enc = write_file(&dir, &format!("short-{len}.enc"), &vec![0x5Au8; len]);
        let (mut engine, sleeps) = decryptor(&["pw"], &mut store);
        let err = engine.try_decrypt(&enc).unwrap_err();

        assert!(matches!(err, TarSealError::Corrupt(_)), "len {len}");
        assert!(engine.prompt().prompts().is_empty());
        assert!(sleeps.borrow().is_empty());
    }
}

#[test]
fn missing_encrypted_file_is_invalid() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryHashStore::new();

    let (mut engine, _) = decryptor(&["pw"], &mut store);
    assert!(matches!(
        engine.try_decrypt(&dir.path().join("gone.enc")),
        Err(TarSealError::InvalidInput(_))
    ));
}

// ---------------------------------------------------------------------------
// Integrity corroboration
// ---------------------------------------------------------------------------

#[test]
fn integrity_mismatch_does_not_fail_decryption() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "pw", &mut store);
    store
        .write_stored_hash("a.tar", &sha256_hex(b"something else"))
        .unwrap();

    let (mut engine, _) = decryptor(&["pw"], &mut store);
    let report = engine.try_decrypt(&enc).expect("decrypt still succeeds");

    let actual = sha256_hex(b"archive");
    assert_eq!(
        report.integrity,
        IntegrityStatus::Mismatch {
            expected: sha256_hex(b"something else"),
            actual: actual.clone(),
        }
    );
    assert_eq!(fs::read(&report.output).unwrap(), b"archive");

    // The decrypted file's own hash is still recorded after a mismatch.
    drop(engine);
    assert_eq!(
        store.read_stored_hash("a.tar-decrypted").unwrap(),
        Some(actual)
    );
}

#[test]
fn missing_baseline_is_reported_not_failed() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive");
    let mut encrypt_store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "pw", &mut encrypt_store);

    let mut fresh = MemoryHashStore::new();
    let (mut engine, _) = decryptor(&["pw"], &mut fresh);
    let report = engine.try_decrypt(&enc).expect("decrypt");

    assert_eq!(report.integrity, IntegrityStatus::NoBaseline);
}

#[test]
fn verification_can_be_skipped() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.tar", b"archive");
    let mut store = MemoryHashStore::new();
    let enc = encrypt_with(&input, "pw", &mut store);

    let (engine, _) = decryptor(&["pw"], &mut store);
    let mut engine = engine.verify_integrity(false);
    let report = engine.try_decrypt(&enc).expect("decrypt");

    assert_eq!(report.integrity, IntegrityStatus::Skipped);
}

#[test]
fn json_store_links_encrypt_and_decrypt() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "nightly.tar.xz", b"tarball bytes");
    let metadata = dir.path().join("config").join("metadata.json");

    let mut encryptor =
        EncryptionEngine::new(ScriptedPrompt::new(["pw", "pw"]), JsonHashStore::new(&metadata));
    assert!(encryptor.encrypt(&input));
    let enc = encrypted_path_for(&input);

    let mut decryptor = DecryptionEngine::new(ScriptedPrompt::new(["pw"]), JsonHashStore::new(&metadata))
        .with_sleeper(|_| {});
    let report = decryptor.try_decrypt(&enc).expect("decrypt");
    assert_eq!(report.integrity, IntegrityStatus::Verified);

    let doc = JsonHashStore::new(&metadata).load().unwrap();
    let keys: Vec<&str> = doc.hashes.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["nightly.tar.xz", "nightly.tar.xz-decrypted", "nightly.tar.xz.enc"]
    );
}
