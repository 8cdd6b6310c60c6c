mod common;

use common::{assert_close, bfv_4096, ckks_8192, real};
use heal::prelude::*;
use proptest::prelude::*;

const P: u64 = 65537;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_bfv_roundtrip(prefix in proptest::collection::vec(0u64..P, 1..16)) {
        let b = bfv_4096();
        let x = Vector::padded(b, &prefix).unwrap();
        prop_assert_eq!(x.encode().unwrap().decode().unwrap(), x.clone());
        prop_assert_eq!(x.encrypt().unwrap().decrypt().unwrap(), x);
    }

    #[test]
    fn prop_bfv_homomorphism(
        a in proptest::collection::vec(0u64..P, 8),
        c in proptest::collection::vec(0u64..P, 8),
    ) {
        let b = bfv_4096();
        let (va, vc) = (Vector::padded(b, &a).unwrap(), Vector::padded(b, &c).unwrap());
        let (ea, ec) = (va.encrypt().unwrap(), vc.encrypt().unwrap());

        prop_assert_eq!((&ea + &ec).decrypt().unwrap(), &va + &vc);
        prop_assert_eq!((&ea - &ec).decrypt().unwrap(), &va - &vc);
        prop_assert_eq!((&ea * &ec).decrypt().unwrap(), &va * &vc);
        prop_assert_eq!((-&ea).decrypt().unwrap(), -&va);

        let encoded = vc.encode().unwrap();
        prop_assert_eq!((&ea + &encoded).decrypt().unwrap(), &va + &vc);
        prop_assert_eq!((&ea * &encoded).decrypt().unwrap(), &va * &vc);
    }

    #[test]
    fn prop_bfv_inner_sum(prefix in proptest::collection::vec(0u64..1000, 1..32), shift in 0i64..4096) {
        let b = bfv_4096();
        let x = &Vector::padded(b, &prefix).unwrap() << shift;
        let expected = prefix.iter().sum::<u64>() % P;
        prop_assert_eq!(x.inner_sum().unwrap().extract_at(0).unwrap(), expected);
        prop_assert_eq!(x.encrypt().unwrap().inner_sum().unwrap().extract_at(0).unwrap(), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn prop_ckks_homomorphism(
        a in proptest::collection::vec(-10.0f64..10.0, 8),
        c in proptest::collection::vec(-10.0f64..10.0, 8),
        k in -64i64..64,
    ) {
        let b = ckks_8192();
        let (va, vc) = (Vector::padded(b, &real(&a)).unwrap(), Vector::padded(b, &real(&c)).unwrap());
        let (ea, ec) = (va.encrypt().unwrap(), vc.encrypt().unwrap());

        assert_close((&ea + &ec).decrypt().unwrap().values(), (&va + &vc).values(), 1e-4);
        assert_close((&ea - &ec).decrypt().unwrap().values(), (&va - &vc).values(), 1e-4);
        assert_close((&ea * &ec).decrypt().unwrap().values(), (&va * &vc).values(), 1e-3);
        assert_close((&ea << k).decrypt().unwrap().values(), (&va << k).values(), 1e-4);
        assert_close((!&ea).conjugate().unwrap().decrypt().unwrap().values(), va.values(), 1e-4);
    }
}
