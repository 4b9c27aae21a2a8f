//! Test fixtures: published AES known-answer vectors.
//!
//! Hex strings are decoded at use with [`hex_bytes`] so the vectors read the
//! same as in the source documents.

// ============================================================================
// NIST SP 800-38A (appendix F)
// ============================================================================

/// AES-128 key shared by the F.1.1, F.2.1 and F.5.1 examples
pub const SP800_38A_KEY_128: &str = "2b7e151628aed2a6abf7158809cf4f3c";

/// AES-256 key shared by the F.1.5, F.2.5 and F.5.5 examples
pub const SP800_38A_KEY_256: &str =
    "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4";

/// Four-block plaintext common to every SP 800-38A example
pub const SP800_38A_PLAINTEXT: &str = "6bc1bee22e409f96e93d7e117393172a\
                                       ae2d8a571e03ac9c9eb76fac45af8e51\
                                       30c81c46a35ce411e5fbc1191a0a52ef\
                                       f69f2445df4f9b17ad2b417be66c3710";

/// F.1.1 ECB-AES128.Encrypt
pub const ECB_AES128_CIPHERTEXT: &str = "3ad77bb40d7a3660a89ecaf32466ef97\
                                         f5d3d58503b9699de785895a96fdbaaf\
                                         43b1cd7f598ece23881b00e3ed030688\
                                         7b0c785e27e8ad3f8223207104725dd4";

/// F.1.5 ECB-AES256.Encrypt
pub const ECB_AES256_CIPHERTEXT: &str = "f3eed1bdb5d2a03c064b5a7e3db181f8\
                                         591ccb10d410ed26dc5ba74a31362870\
                                         b6ed21b99ca6f4f9f153e7b1beafed1d\
                                         23304b7a39f9f3ff067d8d8f9e24ecc7";

/// IV for the CBC examples
pub const CBC_IV: &str = "000102030405060708090a0b0c0d0e0f";

/// F.2.1 CBC-AES128.Encrypt
pub const CBC_AES128_CIPHERTEXT: &str = "7649abac8119b246cee98e9b12e9197d\
                                         5086cb9b507219ee95db113a917678b2\
                                         73bed6b8e3c1743b7116e69e22229516\
                                         3ff1caa1681fac09120eca307586e1a7";

/// Initial counter block for the CTR examples
pub const CTR_IV: &str = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";

/// F.5.1 CTR-AES128.Encrypt
pub const CTR_AES128_CIPHERTEXT: &str = "874d6191b620e3261bef6864990db6ce\
                                         9806f66b7970fdff8617187bb9fffdff\
                                         5ae4df3edbd5d35e5b4f09020db03eab\
                                         1e031dda2fbe03d1792170a0f3009cee";

// ============================================================================
// GCM (McGrew and Viega test cases)
// ============================================================================

/// One GCM known answer.
pub struct GcmVector {
    pub key: &'static str,
    pub nonce: &'static str,
    pub plaintext: &'static str,
    pub aad: &'static str,
    pub ciphertext: &'static str,
    pub tag: &'static str,
}

/// Test case 1: all-zero key and nonce, empty message
pub const GCM_CASE_1: GcmVector = GcmVector {
    key: "00000000000000000000000000000000",
    nonce: "000000000000000000000000",
    plaintext: "",
    aad: "",
    ciphertext: "",
    tag: "58e2fccefa7e3061367f1d57a4e7455a",
};

/// Test case 2: all-zero key and nonce, one zero block
pub const GCM_CASE_2: GcmVector = GcmVector {
    key: "00000000000000000000000000000000",
    nonce: "000000000000000000000000",
    plaintext: "00000000000000000000000000000000",
    aad: "",
    ciphertext: "0388dace60b6a392f328c2b971b2fe78",
    tag: "ab6e47d42cec13bdf53a67b21257bddf",
};

/// Test case 4: 96-bit nonce, partial final block, AAD
pub const GCM_CASE_4: GcmVector = GcmVector {
    key: "feffe9928665731c6d6a8f9467308308",
    nonce: "cafebabefacedbaddecaf888",
    plaintext: "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a72\
                1c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b39",
    aad: "feedfacedeadbeeffeedfacedeadbeefabaddad2",
    ciphertext: "42831ec2217774244b7221b784d0d49ce3aa212f2c02a4e035c17e2329aca12e\
                 21d514b25466931c7d8f6a5aac84aa051ba30b396a0aac973d58e091",
    tag: "5bc94fbc3221a5db94fae95ae7121a47",
};

/// Test case 5: as case 4 with a 64-bit nonce
pub const GCM_CASE_5: GcmVector = GcmVector {
    key: "feffe9928665731c6d6a8f9467308308",
    nonce: "cafebabefacedbad",
    plaintext: "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a72\
                1c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b39",
    aad: "feedfacedeadbeeffeedfacedeadbeefabaddad2",
    ciphertext: "61353b4c2806934a777ff51fa22a4755699b2a714fcdc6f83766e5f97b6c7423\
                 73806900e49f24b22b097544d4896b424989b5e1ebac0f07c23f4598",
    tag: "3612d2e79e3b0785561be14aaca2fccb",
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Decode a fixture hex string.
pub fn hex_bytes(s: &str) -> Vec<u8> {
    hex::decode(s).expect("fixture hex is valid")
}

/// Deterministic non-trivial payload of `size` bytes.
pub fn generate_payload(size: usize, seed: u8) -> Vec<u8> {
    (0..size)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}
