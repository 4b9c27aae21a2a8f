//! Concurrent Use Tests
//!
//! WHAT WE'RE TESTING:
//! - A shared `Gcm` seals and opens from many threads at once
//! - Objects derived from one handle run independently on separate threads
//! - `TlsGcm` hands each counter to exactly one sealer under contention
//! - Every native context is released once all threads finish

mod common;

use common::fixtures::*;
use common::init_tracing;
use fips_cipher_core::{Aead, AesCipher, CipherError};
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

const THREADS: usize = 16;

#[test]
fn test_shared_gcm_across_threads() {
    init_tracing();
    let cipher = AesCipher::new(&[0x42u8; 32]).unwrap();
    let gcm = Arc::new(cipher.new_gcm().unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let gcm = Arc::clone(&gcm);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..50u32 {
                    let mut nonce = [0u8; 12];
                    nonce[..4].copy_from_slice(&(t as u32).to_be_bytes());
                    nonce[8..].copy_from_slice(&i.to_be_bytes());
                    let plaintext = generate_payload(64 + i as usize, t as u8);

                    let mut ct = Vec::new();
                    gcm.seal(&mut ct, &nonce, &plaintext, b"shared")
                        .expect("seal should succeed");
                    let mut pt = Vec::new();
                    gcm.open(&mut pt, &nonce, &ct, b"shared")
                        .expect("open should succeed");
                    assert_eq!(pt, plaintext);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should not panic");
    }

    let snap = cipher.context_stats();
    assert_eq!(snap.contexts_created, (THREADS * 50 * 2) as u64);
    assert_eq!(snap.contexts_live, 0);
}

#[test]
fn test_derived_objects_on_separate_threads() {
    let cipher = AesCipher::new(&hex_bytes(SP800_38A_KEY_128)).unwrap();
    let iv = hex_bytes(CBC_IV);
    let plain = hex_bytes(SP800_38A_PLAINTEXT);
    let expected = hex_bytes(CBC_AES128_CIPHERTEXT);

    let mut enc = cipher.new_cbc_encrypter(&iv).unwrap();
    let mut dec = cipher.new_cbc_decrypter(&iv).unwrap();
    let mut block_enc = cipher.new_encryptor();

    let enc_thread = {
        let plain = plain.clone();
        thread::spawn(move || {
            let mut out = vec![0u8; plain.len()];
            for _ in 0..100 {
                enc.set_iv(&hex_bytes(CBC_IV)).unwrap();
                enc.crypt_blocks(&mut out, &plain).unwrap();
            }
            out
        })
    };
    let dec_thread = {
        let expected = expected.clone();
        thread::spawn(move || {
            let mut out = vec![0u8; expected.len()];
            for _ in 0..100 {
                dec.set_iv(&hex_bytes(CBC_IV)).unwrap();
                dec.crypt_blocks(&mut out, &expected).unwrap();
            }
            out
        })
    };
    let block_thread = thread::spawn(move || {
        let mut block = [0u8; 16];
        for _ in 0..1000 {
            block_enc.crypt_block_in_place(&mut block).unwrap();
        }
        block
    });

    assert_eq!(enc_thread.join().unwrap(), expected);
    assert_eq!(dec_thread.join().unwrap(), plain);
    block_thread.join().unwrap();
    assert_eq!(cipher.context_stats().contexts_live, 0);
}

#[test]
fn test_tls_counters_claimed_once() {
    let cipher = AesCipher::new(&[7u8; 16]).unwrap();
    let tls = Arc::new(cipher.new_gcm_tls().unwrap());
    let accepted = Arc::new(Mutex::new(Vec::new()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let tls = Arc::clone(&tls);
            let accepted = Arc::clone(&accepted);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Every thread races for the same counters.
                for counter in 0..200u64 {
                    let mut nonce = [0u8; 12];
                    nonce[4..].copy_from_slice(&counter.to_be_bytes());
                    let mut out = Vec::new();
                    match tls.seal(&mut out, &nonce, b"record", b"") {
                        Ok(()) => accepted.lock().unwrap().push(counter),
                        Err(CipherError::NonceOrder) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should not panic");
    }

    let accepted = accepted.lock().unwrap();
    let unique: HashSet<_> = accepted.iter().copied().collect();
    assert_eq!(unique.len(), accepted.len(), "a counter was sealed twice");
    assert!(!accepted.is_empty());
}
