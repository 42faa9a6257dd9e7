use serde_json::{json, Value};

use crate::canonicalize::CanonizeOptions;
use crate::cryptosuite::{instantiate_cryptosuite, CryptoSuite};
use crate::document::Document;
use crate::error::Error;
use crate::key::{Curve, ALGORITHM};
use crate::loader::StaticLoader;
use crate::proof::ProofOptions;
use crate::suites::ecdsa_jcs_2019::EcdsaJcs2019Suite;
use crate::suites::ecdsa_rdfc_2019::EcdsaRdfc2019Suite;
use crate::suites::utils::{multibase_decode, multibase_encode};
use crate::verification::VerificationMethod;

const CONTROLLER: &str = "https://example.edu/issuers/565049";

const P256_PUBLIC_MULTIKEY: &str = "zDnaeqarma38o3bN4T4W17ZjUgExppDkRzMY6EAxMo7UbnLiK";
const P256_SECRET_MULTIKEY: &str = "z42tpJhgKEk6dTkSKBadxpEDzWXTYFC9BCMZ31yoNa7RwpJF";
const P384_PUBLIC_MULTIKEY: &str =
    "z82LkmMrCtmhr7U45UnUUVN1zRS3Px1rxouZXnQ7aEf3GLLMVGxaDTGDsLC4ZGWG4KFUSHX";
const P384_SECRET_MULTIKEY: &str =
    "z2faqYHCDYyQ24ToEzmb5BG9zgjGopvyL5kPj3r86PGWZv9M6mKD4QRbTA9PQkupZ6TrxD";
const P521_PUBLIC_MULTIKEY: &str =
    "z2J9gaYrYDuiuQHVQH8R2waXswDXzVvnBX9YoJmDNTARkCuBAWPgJPJnag87eHvzLtcC5uTeavgFPhn3NEmoENwqseXkt9n6";
const P521_SECRET_MULTIKEY: &str =
    "zJp6stvnZK1Fad2u4ub8ksZb8SPpVNnWrCHvmWXqfAJMK283LVgFJfPg9KDxvKVkMjPsDN4B7hNXgB8hF3H5wUv328h7C5";

const P256_LEGACY_PUBLIC_BASE58: &str = "22cXTw1K8K7pbpuBMF3d71vYamQdJDz1xHKevEHtgQZfD";
const P256_LEGACY_PRIVATE_BASE58: &str = "7RPcMV6VveQA57beiffvALxPgL1BW9xfz1kJtFB6xPWb";

const EXPECTED_CREDENTIAL_NQUADS: &str = "\
<http://example.edu/credentials/1872> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://schema.org#AlumniCredential> .\n\
<http://example.edu/credentials/1872> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .\n\
<http://example.edu/credentials/1872> <https://www.w3.org/2018/credentials#credentialSubject> <https://example.edu/students/alice> .\n\
<http://example.edu/credentials/1872> <https://www.w3.org/2018/credentials#issuanceDate> \"2010-01-01T19:23:24Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n\
<http://example.edu/credentials/1872> <https://www.w3.org/2018/credentials#issuer> <https://example.edu/issuers/565049> .\n\
<https://example.edu/students/alice> <https://schema.org#alumniOf> \"Example University\" .\n";

// Pinned stand-ins for the public contexts the fixture credential
// references, covering the terms the fixtures use.
fn mock_loader() -> StaticLoader {
    StaticLoader::new()
        .with_document(
            "https://www.w3.org/2018/credentials/v1",
            json!({
                "@context": {
                    "id": "@id",
                    "type": "@type",
                    "cred": "https://www.w3.org/2018/credentials#",
                    "xsd": "http://www.w3.org/2001/XMLSchema#",
                    "VerifiableCredential": "cred:VerifiableCredential",
                    "credentialSubject": {"@id": "cred:credentialSubject", "@type": "@id"},
                    "issuer": {"@id": "cred:issuer", "@type": "@id"},
                    "issuanceDate": {"@id": "cred:issuanceDate", "@type": "xsd:dateTime"}
                }
            }),
        )
        .with_document(
            "https://w3id.org/security/data-integrity/v1",
            json!({
                "@context": {
                    "id": "@id",
                    "type": "@type",
                    "sec": "https://w3id.org/security#",
                    "dc": "http://purl.org/dc/terms/",
                    "xsd": "http://www.w3.org/2001/XMLSchema#",
                    "DataIntegrityProof": "sec:DataIntegrityProof",
                    "cryptosuite": "sec:cryptosuite",
                    "proof": {"@id": "sec:proof", "@type": "@id"},
                    "proofPurpose": {"@id": "sec:proofPurpose", "@type": "@vocab"},
                    "proofValue": "sec:proofValue",
                    "verificationMethod": {"@id": "sec:verificationMethod", "@type": "@id"},
                    "created": {"@id": "dc:created", "@type": "xsd:dateTime"},
                    "expires": {"@id": "sec:expiration", "@type": "xsd:dateTime"},
                    "challenge": "sec:challenge",
                    "domain": "sec:domain",
                    "nonce": "sec:nonce",
                    "assertionMethod": {"@id": "sec:assertionMethod", "@type": "@id"},
                    "authentication": {"@id": "sec:authenticationMethod", "@type": "@id"}
                }
            }),
        )
}

// The fixture credential: issuer 565049 asserting Alice's alumni status.
fn credential() -> Document {
    Document::from_json_value(json!({
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            {
                "AlumniCredential": "https://schema.org#AlumniCredential",
                "alumniOf": "https://schema.org#alumniOf"
            },
            "https://w3id.org/security/data-integrity/v1"
        ],
        "id": "http://example.edu/credentials/1872",
        "type": ["VerifiableCredential", "AlumniCredential"],
        "issuer": "https://example.edu/issuers/565049",
        "issuanceDate": "2010-01-01T19:23:24Z",
        "credentialSubject": {
            "id": "https://example.edu/students/alice",
            "alumniOf": "Example University"
        }
    }))
    .expect("Failed to create fixture credential")
}

fn multikey_method(public: &str, secret: Option<&str>) -> VerificationMethod {
    VerificationMethod {
        id: format!("{CONTROLLER}#key-1"),
        type_: "Multikey".to_string(),
        controller: CONTROLLER.to_string(),
        public_key_multibase: Some(public.to_string()),
        secret_key_multibase: secret.map(ToString::to_string),
        public_key_base58: None,
        private_key_base58: None,
    }
}

fn legacy_p256_method() -> VerificationMethod {
    VerificationMethod {
        id: format!("{CONTROLLER}#key-2"),
        type_: "EcdsaSecp256r1VerificationKey2019".to_string(),
        controller: CONTROLLER.to_string(),
        public_key_multibase: None,
        secret_key_multibase: None,
        public_key_base58: Some(P256_LEGACY_PUBLIC_BASE58.to_string()),
        private_key_base58: Some(P256_LEGACY_PRIVATE_BASE58.to_string()),
    }
}

fn proof_options() -> ProofOptions {
    ProofOptions::new()
        .with_proof_purpose("assertionMethod")
        .with_created("2023-03-10T15:00:00Z")
}

fn sign_credential(
    suite: &dyn CryptoSuite,
    method: &VerificationMethod,
    loader: &StaticLoader,
) -> Document {
    let signer = suite.create_signer(method).expect("Failed to create signer");
    let options = CanonizeOptions {
        document_loader: loader,
    };
    suite
        .create_proof(&credential(), &proof_options(), &signer, &options)
        .expect("Failed to create proof")
}

#[test]
fn test_suite_exports() {
    let suite = EcdsaRdfc2019Suite::new();
    assert_eq!(suite.name(), "ecdsa-2019");
    assert_eq!(suite.required_curves(), [Curve::P256].as_slice());
}

#[test]
fn test_canonize_matches_expected_nquads() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let canonical = suite
        .canonize(
            &credential().to_value(),
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .expect("Failed to canonize credential");

    assert_eq!(canonical, EXPECTED_CREDENTIAL_NQUADS);
    assert_eq!(canonical.lines().count(), 6);
}

#[test]
fn test_canonize_is_deterministic() {
    let loader = mock_loader();
    let options = CanonizeOptions {
        document_loader: &loader,
    };

    let first = crate::canonize(&credential().to_value(), &options).expect("first run");
    let second = crate::canonize(&credential().to_value(), &options).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn test_canonize_is_isomorphism_invariant() {
    let loader = mock_loader();
    let options = CanonizeOptions {
        document_loader: &loader,
    };

    // Same credential with object keys and the type array reordered;
    // the RDF dataset is unchanged.
    let reordered: Value = serde_json::from_str(
        r#"{
            "credentialSubject": {
                "alumniOf": "Example University",
                "id": "https://example.edu/students/alice"
            },
            "issuanceDate": "2010-01-01T19:23:24Z",
            "issuer": "https://example.edu/issuers/565049",
            "type": ["AlumniCredential", "VerifiableCredential"],
            "id": "http://example.edu/credentials/1872",
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                {
                    "alumniOf": "https://schema.org#alumniOf",
                    "AlumniCredential": "https://schema.org#AlumniCredential"
                },
                "https://w3id.org/security/data-integrity/v1"
            ]
        }"#,
    )
    .expect("Failed to parse reordered credential");

    assert_eq!(
        crate::canonize(&credential().to_value(), &options).expect("canonize"),
        crate::canonize(&reordered, &options).expect("canonize reordered")
    );
}

#[test]
fn test_canonize_fails_without_context_resolution() {
    let loader = StaticLoader::new();
    let err = crate::canonize(
        &credential().to_value(),
        &CanonizeOptions {
            document_loader: &loader,
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::LoaderResolution(_)));
}

#[test]
fn test_sign_and_verify_multikey() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));

    let secured = sign_credential(&suite, &method, &loader);
    let proof = secured.get_proof().expect("Secured document should have a proof");
    assert_eq!(proof.type_(), "DataIntegrityProof");
    assert_eq!(proof.cryptosuite(), "ecdsa-2019");
    assert!(proof.proof_value.starts_with('z'));

    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");
    assert_eq!(verifier.algorithm, ALGORITHM);
    assert_eq!(verifier.id(), method.id);

    let result = suite
        .verify_proof(
            &secured,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .expect("Failed to verify proof");
    assert!(result.verified, "Proof verification should succeed");
    assert!(result.verified_document.is_some());
}

#[test]
fn test_sign_and_verify_legacy_key() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = legacy_p256_method();

    let secured = sign_credential(&suite, &method, &loader);
    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");
    let result = suite
        .verify_proof(
            &secured,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .expect("Failed to verify proof");
    assert!(result.verified);
}

#[test]
fn test_sign_and_verify_companion_curves() {
    let loader = mock_loader();
    for (curve, public, secret) in [
        (Curve::P384, P384_PUBLIC_MULTIKEY, P384_SECRET_MULTIKEY),
        (Curve::P521, P521_PUBLIC_MULTIKEY, P521_SECRET_MULTIKEY),
    ] {
        let suite = EcdsaRdfc2019Suite::with_curves(&[curve]);
        let method = multikey_method(public, Some(secret));

        let secured = sign_credential(&suite, &method, &loader);
        let verifier = suite.create_verifier(&method).expect("Failed to create verifier");
        let result = suite
            .verify_proof(
                &secured,
                &verifier,
                &CanonizeOptions {
                    document_loader: &loader,
                },
            )
            .expect("Failed to verify proof");
        assert!(result.verified, "round trip should succeed on {curve}");
    }
}

#[test]
fn test_jcs_suite_round_trip() {
    let loader = mock_loader();
    let suite = EcdsaJcs2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));

    let secured = sign_credential(&suite, &method, &loader);
    let proof = secured.get_proof().expect("Secured document should have a proof");
    assert_eq!(proof.cryptosuite(), "ecdsa-jcs-2019");

    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");
    let result = suite
        .verify_proof(
            &secured,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .expect("Failed to verify proof");
    assert!(result.verified);
}

#[test]
fn test_tampered_document_fails_verification() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));

    let secured = sign_credential(&suite, &method, &loader);
    let mut data = secured.to_value();
    data["credentialSubject"]["alumniOf"] = json!("Evil University");
    let tampered = Document::from_json_value(data).expect("Failed to rebuild document");

    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");
    let result = suite
        .verify_proof(
            &tampered,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .expect("Tampered content must not raise, only fail verification");
    assert!(!result.verified);
    assert!(result.verified_document.is_none());
}

#[test]
fn test_tampered_signature_fails_verification() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));

    let secured = sign_credential(&suite, &method, &loader);
    let mut data = secured.to_value();
    let proof_value = data["proof"]["proofValue"]
        .as_str()
        .expect("proofValue should be a string")
        .to_string();
    let mut signature = multibase_decode(&proof_value).expect("Failed to decode proofValue");
    signature[10] ^= 0x01;
    data["proof"]["proofValue"] = json!(multibase_encode(&signature));
    let tampered = Document::from_json_value(data).expect("Failed to rebuild document");

    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");
    let result = suite
        .verify_proof(
            &tampered,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .expect("A flipped signature bit must not raise");
    assert!(!result.verified);
}

#[test]
fn test_create_verifier_with_unsupported_key_type() {
    let suite = EcdsaRdfc2019Suite::new();
    let mut method = multikey_method(P256_PUBLIC_MULTIKEY, None);
    method.type_ = "BadKeyType".to_string();

    let err = suite.create_verifier(&method).unwrap_err();
    assert!(matches!(err, Error::UnsupportedKeyType(_)));
    assert!(err.to_string().contains("BadKeyType"));
}

#[test]
fn test_create_verifier_with_wrong_curve() {
    // P-384 key under a P-256-only suite instance.
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P384_PUBLIC_MULTIKEY, None);

    let err = suite.create_verifier(&method).unwrap_err();
    assert!(matches!(err, Error::AlgorithmMismatch(_)));
}

#[test]
fn test_create_signer_requires_private_key() {
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, None);

    let err = suite.create_signer(&method).unwrap_err();
    assert!(matches!(err, Error::MissingPrivateKey));
}

#[test]
fn test_sign_with_incorrect_signer_algorithm() {
    let loader = mock_loader();
    // Signer produced by a P-384 instance, used with the strict suite.
    let p384_suite = EcdsaRdfc2019Suite::with_curves(&[Curve::P384]);
    let method = multikey_method(P384_PUBLIC_MULTIKEY, Some(P384_SECRET_MULTIKEY));
    let signer = p384_suite.create_signer(&method).expect("Failed to create signer");

    let suite = EcdsaRdfc2019Suite::new();
    let err = suite
        .create_proof(
            &credential(),
            &proof_options(),
            &signer,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::AlgorithmMismatch(_)));
}

#[test]
fn test_sign_with_undefined_term_in_document() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let signer = suite.create_signer(&method).expect("Failed to create signer");

    let mut data = credential().to_value();
    data["undefinedTerm"] = json!("foo");
    let document = Document::from_json_value(data).expect("Failed to rebuild document");

    let err = suite
        .create_proof(
            &document,
            &proof_options(),
            &signer,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedTerm(term) if term == "undefinedTerm"));
}

#[test]
fn test_sign_with_undefined_term_in_proof() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let signer = suite.create_signer(&method).expect("Failed to create signer");

    let options = proof_options().with_property("undefinedTerm", json!("foo"));
    let err = suite
        .create_proof(
            &credential(),
            &options,
            &signer,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedTerm(term) if term == "undefinedTerm"));
}

#[test]
fn test_sign_with_relative_type_url() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let signer = suite.create_signer(&method).expect("Failed to create signer");

    let options = proof_options().with_type("UndefinedType");
    let err = suite
        .create_proof(
            &credential(),
            &options,
            &signer,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::RelativeUrl(type_) if type_ == "UndefinedType"));
}

#[test]
fn test_verify_fails_if_proof_value_is_not_string() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");

    let secured = sign_credential(&suite, &method, &loader);
    let mut data = secured.to_value();
    data["proof"]["proofValue"] = json!(42);
    let mangled = Document::from_json_value(data).expect("Failed to rebuild document");

    let err = suite
        .verify_proof(
            &mangled,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProofValue(_)));
}

#[test]
fn test_verify_fails_if_proof_value_is_missing() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");

    let secured = sign_credential(&suite, &method, &loader);
    let mut data = secured.to_value();
    data["proof"]
        .as_object_mut()
        .expect("proof should be an object")
        .remove("proofValue");
    let mangled = Document::from_json_value(data).expect("Failed to rebuild document");

    let err = suite
        .verify_proof(
            &mangled,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProofValue(_)));
}

#[test]
fn test_verify_fails_if_proof_value_prefix_is_not_z() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");

    let secured = sign_credential(&suite, &method, &loader);
    let mut data = secured.to_value();
    let proof_value = data["proof"]["proofValue"]
        .as_str()
        .expect("proofValue should be a string")
        .to_string();
    data["proof"]["proofValue"] = json!(format!("a{}", &proof_value[1..]));
    let mangled = Document::from_json_value(data).expect("Failed to rebuild document");

    let err = suite
        .verify_proof(
            &mangled,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProofValue(_)));
}

#[test]
fn test_verify_fails_if_proof_type_is_not_data_integrity() {
    let loader = mock_loader();
    let suite = EcdsaRdfc2019Suite::new();
    let method = multikey_method(P256_PUBLIC_MULTIKEY, Some(P256_SECRET_MULTIKEY));
    let verifier = suite.create_verifier(&method).expect("Failed to create verifier");

    let secured = sign_credential(&suite, &method, &loader);
    let mut data = secured.to_value();
    data["proof"]["type"] = json!("UnknownProofType");
    let mangled = Document::from_json_value(data).expect("Failed to rebuild document");

    let err = suite
        .verify_proof(
            &mangled,
            &verifier,
            &CanonizeOptions {
                document_loader: &loader,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidProofType(type_) if type_ == "UnknownProofType"));
}

#[test]
fn test_instantiate_cryptosuite() {
    let suite = instantiate_cryptosuite("ecdsa-2019").expect("Failed to instantiate");
    assert_eq!(suite.name(), "ecdsa-2019");

    let suite = instantiate_cryptosuite("ecdsa-jcs-2019").expect("Failed to instantiate");
    assert_eq!(suite.name(), "ecdsa-jcs-2019");

    let err = instantiate_cryptosuite("eddsa-2022").unwrap_err();
    assert!(matches!(err, Error::UnsupportedCryptoSuite(name) if name == "eddsa-2022"));
}

#[test]
fn test_document_io() {
    let document = credential();

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("credential.json");

    document.to_file(&file_path).expect("Failed to save document");
    let loaded = Document::from_file(&file_path).expect("Failed to load document");

    assert_eq!(document.data().get("issuer"), loaded.data().get("issuer"));
    assert_eq!(
        document.data().get("credentialSubject"),
        loaded.data().get("credentialSubject")
    );
}
