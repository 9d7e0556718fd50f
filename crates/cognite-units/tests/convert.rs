use cognite_units::{
    ConvertOptions, DIMENSIONLESS_UNIT_TYPE, UnitDictionary, UnitError, Values, unit_convert,
};
use insta::assert_snapshot;

fn convert(value: f64, input: &str, output: &str) -> f64 {
    unit_convert(value, input, output, &ConvertOptions::default())
        .unwrap_or_else(|e| panic!("{input} -> {output}: {e}"))
        .value
        .as_scalar()
        .unwrap()
}

fn convert_as(value: f64, input: &str, output: &str, unit_type: &str) -> Result<f64, UnitError> {
    let options = ConvertOptions::new().unit_type(unit_type);
    unit_convert(value, input, output, &options).map(|c| c.value.as_scalar().unwrap())
}

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn every_unit_converts_to_itself_and_back() {
    let dict = UnitDictionary::bundled();
    for unit_type in dict.unit_types() {
        if unit_type.name == DIMENSIONLESS_UNIT_TYPE {
            continue;
        }
        let options = ConvertOptions::new().unit_type(unit_type.name.clone());
        for unit in &unit_type.units {
            let same = dict.convert(12.5, unit, unit, &options).unwrap();
            assert_close(same.value.as_scalar().unwrap(), 12.5);

            for other in &unit_type.units {
                let there = dict.convert(12.5, unit, other, &options).unwrap();
                let back = dict
                    .convert(there.value, other, unit, &options)
                    .unwrap();
                assert_close(back.value.as_scalar().unwrap(), 12.5);
            }
        }
    }
}

#[test]
fn linear_units() {
    assert_close(convert(1.0, "ft", "m"), 0.3048);
    assert_close(convert(1.0, "m", "ft"), 1.0 / 0.3048);
    assert_close(convert(1.0, "mile", "km"), 1.609344);
    assert_close(convert(1.0, "lbm", "kg"), 0.45359237);
    assert_close(convert(2.0, "h", "min"), 120.0);
    assert_close(convert(1.0, "kilolbf", "lbf"), 1000.0);
    assert_close(convert(1.0, "atm", "bar"), 1.01325);
}

#[test]
fn temperature_scales_are_affine() {
    assert_close(convert(0.0, "C", "F"), 32.0);
    assert_close(convert(100.0, "C", "F"), 212.0);
    assert_close(convert(-40.0, "F", "C"), -40.0);
    assert_close(convert(0.0, "K", "C"), -273.15);
    assert_close(convert(491.67, "R", "F"), 32.0);
}

#[test]
fn gauge_pressures_are_affine() {
    assert_close(convert(0.0, "barg", "psig"), 0.0);
    assert_close(convert(1.0, "barg", "bar"), 2.01325);
    assert_close(convert(0.0, "psig", "Pa"), 101325.0);
    assert_close(convert(14.5, "psi", "psi"), 14.5);
}

#[test]
fn shifts_are_ignored_outside_affine_dimensions() {
    // Energy per temperature difference: the Celsius shift must not apply.
    assert_close(convert(1.0, "J/(kg*C)", "J/(kg*K)"), 1.0);
    assert_close(convert(1.0, "Btu/(lbm*F)", "J/(kg*K)"), 4186.8);
}

#[test]
fn compound_units() {
    assert_close(convert(1.0, "acre*ft", "m3"), 1233.48183754752);
    assert_close(convert(1.0, "kilolbf/(in*in)", "psi"), 1000.0);
    assert_close(convert(1.0, "bbl/d", "m3/s"), 0.158987294928 / 86400.0);
    assert_close(convert(1.0, "kg.m/s2", "N"), 1.0);
    assert_close(convert(1.0, "N-m", "J"), 1.0);
    assert_close(convert(60.0, "rpm", "Hz"), 1.0);
    assert_close(convert(1.0, "1/s", "Hz"), 1.0);
    assert_close(convert(10.0, "10mile/h", "mph"), 100.0);
}

#[test]
fn exponents_match_repeated_factors() {
    let cubic = convert(1.0, "m3", "ft3");
    assert_close(cubic, convert(1.0, "m*m*m", "ft*ft*ft"));
    assert_close(cubic, 1.0 / 0.3048f64.powi(3));
    assert_close(convert(1.0, "cm3", "m3"), 1e-6);
    assert_close(convert(1.0, "km2", "ha"), 100.0);
}

#[test]
fn series_convert_elementwise() {
    let converted = unit_convert(
        vec![0.0, 100.0, -40.0],
        "C",
        "F",
        &ConvertOptions::default(),
    )
    .unwrap();
    let series = converted.value.as_series().unwrap();
    for (actual, expected) in series.iter().zip([32.0, 212.0, -40.0]) {
        assert_close(*actual, expected);
    }
}

#[test]
fn unit_aware_results_carry_the_output_unit() {
    let options = ConvertOptions::new().unit_aware(true);
    let converted = unit_convert(3, "ft", "in", &options).unwrap();
    assert_eq!(converted.unit.as_deref(), Some("in"));
    assert_close(converted.value.as_scalar().unwrap(), 36.0);

    let plain = unit_convert(3, "ft", "in", &ConvertOptions::default()).unwrap();
    assert_eq!(plain.unit, None);
}

#[test]
fn dimensionless_values_pass_through() {
    let options = ConvertOptions::new().unit_type("-").unit_aware(true);
    let converted = unit_convert(vec![1.0, 2.0], "whatever", "else", &options).unwrap();
    assert_eq!(converted.value, Values::Series(vec![1.0, 2.0]));
    assert_eq!(converted.unit.as_deref(), Some("else"));
}

#[test]
fn declared_unit_types_are_enforced() {
    assert_close(convert_as(1.0, "m/s", "knot", "velocity").unwrap(), 3600.0 / 1852.0);
    assert_snapshot!(
        convert_as(1.0, "m", "ft", "velocity").unwrap_err(),
        @"'m' is not a valid unit of the unit type 'velocity'"
    );
    assert_snapshot!(
        convert_as(1.0, "m", "ft", "speediness").unwrap_err(),
        @"'speediness' is not a valid unit type"
    );
}

#[test]
fn restricted_aliases() {
    let liquid = "liquid volume flow rate";
    assert_close(
        convert_as(1.0, "bbl/d", "m3/s", liquid).unwrap(),
        0.158987294928 / 86400.0,
    );
    assert_close(convert_as(1.0, "L/min", "m3/h", liquid).unwrap(), 0.06);
    assert_snapshot!(
        convert_as(1.0, "ft3/d", "m3/s", liquid).unwrap_err(),
        @r#"Units ["ft"] in 'ft3/d' are not allowed for the unit type 'liquid volume flow rate'"#
    );

    assert_close(convert_as(0.0, "barg", "psig", "gauge pressure").unwrap(), 0.0);
    assert!(matches!(
        convert_as(1.0, "bar", "psig", "gauge pressure"),
        Err(UnitError::RestrictedUnit { .. })
    ));

    // Unrestricted aliases behave like the unit type they point to.
    assert_close(
        convert_as(1.0, "g/(cm*cm*cm)", "kg/m3", "fluid density").unwrap(),
        1000.0,
    );
}

#[test]
fn invalid_conversions() {
    let err = unit_convert(1.0, "m", "s", &ConvertOptions::default()).unwrap_err();
    assert_snapshot!(err, @"Cannot convert 'm' (distance) to 's' (time): dimensions differ");

    let err = unit_convert(1.0, "furlong", "m", &ConvertOptions::default()).unwrap_err();
    assert_snapshot!(err, @"'furlong' is not defined in unit_conversion dictionary");

    let err = unit_convert(1.0, "(m/s)*s", "m", &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, UnitError::InvalidSyntax { .. }));

    let err = unit_convert(1.0, "kg/m*s", "Pa", &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, UnitError::InvalidSyntax { .. }));

    let err = unit_convert(1.0, "s1000000000000000000", "s", &ConvertOptions::default())
        .unwrap_err();
    assert_snapshot!(
        err,
        @"Invalid unit syntax in 's1000000000000000000': exponent 1000000000000000000 is outside 1..=12"
    );

    // Zero exponents and numerals must not drop or zero a factor.
    let err = unit_convert(1.0, "m/s0", "m", &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, UnitError::InvalidSyntax { .. }));
    let err = unit_convert(1.0, "m", "0m", &ConvertOptions::default()).unwrap_err();
    assert_snapshot!(
        err,
        @"Invalid unit syntax in '0m': numeric multipliers must be positive and finite"
    );
}

#[test]
fn conversion_trace() {
    let options = ConvertOptions::new().show_conversions(true);
    let converted = unit_convert(300.0, "K", "C", &options).unwrap();
    assert_close(converted.value.as_scalar().unwrap(), 26.85);

    let trace = converted.trace.unwrap();
    assert_eq!(trace.unit_type, "temperature");
    assert_eq!(
        trace.to_string(),
        "unit type: temperature\n\
         K (K):\n  K [K] to K: x * 1\n  to base: x * 1\n\
         C (C):\n  C [C] to K: x * 1 + 273.15\n  to base: x * 1 + 273.15\n\
         K -> C: x * 1 - 273.15"
    );

    let scaled = unit_convert(1.0, "km/h", "m/s", &options).unwrap();
    let trace = scaled.trace.unwrap();
    assert_eq!(trace.input.normalized, "m/h");
    assert_close(trace.input.factor, 1000.0);
    assert_close(scaled.value.as_scalar().unwrap(), 1.0 / 3.6);

    assert_eq!(
        unit_convert(vec![1.0, 2.0], "K", "C", &options).unwrap_err(),
        UnitError::ShowConversionsNonScalar
    );
}

#[test]
fn custom_tables_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("unit_conversion.json"),
        r#"{
            "distance": {"base_unit": "m", "fundamental": true,
                         "units": {"m": {"multiplier": "1"},
                                   "league": {"multiplier": "1/4828.032"}}},
            "time": {"base_unit": "s", "fundamental": true,
                     "units": {"s": {"multiplier": "1"}, "fortnight": {"multiplier": "1/1209600"}}},
            "velocity": {"base_unit": "m/s", "units": {}}
        }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("unit_type_fundamental.json"),
        r#"{"distance": ["distance"], "time": ["time"], "velocity": ["distance/time"]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("scalers.json"),
        r#"{"kilo": {"scale factor": 1000, "aliases": ["k"]}}"#,
    )
    .unwrap();

    let dict = UnitDictionary::from_dir(dir.path()).unwrap();
    let converted = dict
        .convert(1.0, "league/fortnight", "m/s", &ConvertOptions::default())
        .unwrap();
    assert_close(converted.value.as_scalar().unwrap(), 4828.032 / 1209600.0);

    // The bundled tables are untouched.
    assert!(
        UnitDictionary::bundled()
            .convert(1.0, "league", "m", &ConvertOptions::default())
            .is_err()
    );
}
