use grb_types::{ElementType, GrbScalar, TypeCode, GRB_INDEX_MAX};

#[test]
fn builtin_sizes_match_scalar_layout() {
    assert_eq!(ElementType::builtin(TypeCode::Bool).size(), 1);
    assert_eq!(ElementType::builtin(TypeCode::Int64).size(), 8);
    assert_eq!(ElementType::builtin(TypeCode::Fc64).size(), 16);
    assert_eq!(i32::TYPE_CODE, TypeCode::Int32);
    assert_eq!(f64::TYPE_CODE, TypeCode::Fp64);
}

#[test]
fn all_builtins_round_trip_through_raw_code() {
    for code in TypeCode::ALL {
        let raw = code as u32;
        assert_eq!(TypeCode::from_raw(raw).unwrap(), code);
    }
}

#[test]
fn unknown_raw_code_is_invalid_value() {
    assert!(TypeCode::from_raw(200).is_err());
}

#[test]
fn complex_types_are_not_ordered() {
    assert!(!TypeCode::Fc32.is_ordered());
    assert!(!TypeCode::Fc64.is_ordered());
    assert!(TypeCode::Int64.is_ordered());
}

#[test]
fn index_max_is_2_60_minus_1() {
    assert_eq!(GRB_INDEX_MAX, (1u64 << 60) - 1);
    assert!(grb_types::index_in_bounds(GRB_INDEX_MAX));
    assert!(!grb_types::index_in_bounds(GRB_INDEX_MAX + 1));
}
