// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Property-Based Tests (proptest) for flux-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for flux-types using proptest.
//!
//! Covers: equilibrium config serialization roundtrip, compute option
//! validation.

use flux_types::config::{ComputeOptions, EquilibriumConfig};
use proptest::prelude::*;

// ── Config Serialization ─────────────────────────────────────────────

proptest! {
    /// Serializing and reloading a config preserves resolution and rows.
    #[test]
    fn config_json_roundtrip(
        psi in 0.01f64..10.0,
        r0 in 2.0f64..20.0,
        a in 0.1f64..1.5,
        iota in -2.0f64..2.0,
        l in 1usize..12,
        m in 1usize..12,
        n in 0usize..6,
    ) {
        let mut cfg = EquilibriumConfig::circular_tokamak(psi, r0, a, iota);
        cfg.l = l;
        cfg.m = m;
        cfg.n = n;
        let json = serde_json::to_string(&cfg).expect("serialize");
        let back = EquilibriumConfig::from_json(&json).expect("deserialize");

        prop_assert_eq!(back.l, l);
        prop_assert_eq!(back.m, m);
        prop_assert_eq!(back.n, n);
        prop_assert!((back.psi - psi).abs() < 1e-12 * psi.max(1.0));
        prop_assert_eq!(back.boundary.len(), 3);
        prop_assert_eq!(back.spectral_indexing, cfg.spectral_indexing);
    }
}

// ── Compute Options ──────────────────────────────────────────────────

proptest! {
    /// Any finite gamma away from 1 with a non-trivial helicity is accepted.
    #[test]
    fn compute_options_accept_valid(
        gamma in prop_oneof![-5.0f64..0.99, 1.01f64..5.0],
        hm in -3i32..4,
        hn in -3i32..4,
    ) {
        prop_assume!((hm, hn) != (0, 0));
        let opts = ComputeOptions { helicity: (hm, hn), gamma, ..Default::default() };
        prop_assert!(opts.validate().is_ok());
    }
}
