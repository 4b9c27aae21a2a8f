#![no_main]

use arbitrary::Arbitrary;
use fips_cipher_core::{AesCipher, CipherError};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct ModeInput {
    key: Vec<u8>,
    iv: Vec<u8>,
    data: Vec<u8>,
    dst_len: u16,
}

fuzz_target!(|input: ModeInput| {
    // Attack: arbitrary key, IV, input and output lengths against CBC and CTR
    // Validates: no panics, length checks fire before any write, round trips

    let Ok(cipher) = AesCipher::new(&input.key) else {
        return;
    };
    let mut dst = vec![0u8; input.dst_len as usize];

    match cipher.new_cbc_encrypter(&input.iv) {
        Ok(mut cbc) => match cbc.crypt_blocks(&mut dst, &input.data) {
            Ok(()) => {
                let len = input.data.len();
                let mut back = vec![0u8; len];
                let mut dec = cipher
                    .new_cbc_decrypter(&input.iv)
                    .expect("IV already accepted");
                dec.crypt_blocks(&mut back, &dst[..len])
                    .expect("aligned ciphertext decrypts");
                assert_eq!(back, input.data);
            }
            Err(CipherError::BlockAlignment(len)) => assert!(len % 16 != 0),
            Err(CipherError::Length { needed, actual }) => assert!(actual < needed),
            Err(err) => panic!("unexpected CBC error: {err}"),
        },
        Err(err) => assert!(matches!(err, CipherError::IvLength { .. })),
    }

    if let Ok(mut ctr) = cipher.new_ctr(&input.iv) {
        let mut buf = input.data.clone();
        ctr.apply_keystream(&mut buf).expect("in-place CTR never fails");
        let mut ctr = cipher.new_ctr(&input.iv).expect("IV already accepted");
        ctr.apply_keystream(&mut buf).expect("in-place CTR never fails");
        assert_eq!(buf, input.data);
    }
});
