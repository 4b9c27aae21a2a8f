#![no_main]

use arbitrary::Arbitrary;
use fips_cipher_core::{Aead, AesCipher, CipherError, InOutBuf};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct OpenInput {
    key: Vec<u8>,
    nonce_size: u8,
    tag_size: u8,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    ciphertext: Vec<u8>,
}

fuzz_target!(|input: OpenInput| {
    // Attack: forged ciphertexts, tags and shapes against open on both GCM paths
    // Validates: no panics, no plaintext released on failure

    let Ok(cipher) = AesCipher::new(&input.key) else {
        return;
    };
    let Ok(gcm) = cipher.new_gcm_with_sizes(input.nonce_size as usize, input.tag_size as usize) else {
        return;
    };

    let mut out = vec![0xA5u8; input.ciphertext.len()];
    match gcm.open_inout(&input.nonce, InOutBuf::new(&mut out, &input.ciphertext), &input.aad) {
        Ok(written) => {
            assert_eq!(written + gcm.overhead(), input.ciphertext.len());
        }
        Err(CipherError::Authentication) => {
            let ct_len = input.ciphertext.len().saturating_sub(gcm.overhead());
            assert!(
                out[..ct_len].iter().all(|&b| b == 0),
                "failed open must zero its output"
            );
        }
        Err(err) => assert!(err.is_fatal(), "unexpected recoverable error: {err}"),
    }

    // Sealing then opening the same bytes must round-trip.
    if input.nonce.len() == gcm.nonce_size() {
        let mut sealed = Vec::new();
        gcm.seal(&mut sealed, &input.nonce, &input.ciphertext, &input.aad)
            .expect("seal with a valid nonce succeeds");
        let mut opened = Vec::new();
        gcm.open(&mut opened, &input.nonce, &sealed, &input.aad)
            .expect("open of a fresh seal succeeds");
        assert_eq!(opened, input.ciphertext);
    }

    assert_eq!(cipher.context_stats().contexts_live, 0);
});
