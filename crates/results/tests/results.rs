//! Integration tests for the physical interpretation of fit results

use ncstools_fitting::{FitResult, FitSpec, ParameterRow, ParameterTable};
use ncstools_profiles::ProfileKind;
use ncstools_results::{Degeneracy, Error, ResultTransformer, TransformOptions};
use rstest::{fixture, rstest};

fn result(rows: Vec<ParameterRow>) -> FitResult {
    FitResult {
        name: "15039_data_spectrum_135".to_string(),
        reduced_chi_square: 1.1,
        parameters: ParameterTable::new(rows),
        curve: None,
    }
}

fn gaussians(n: usize) -> FitSpec {
    let descriptors = vec!["function=Gaussian,width=[5, 10, 15]"; n].join(";");
    FitSpec::from_descriptors(&vec![16.0; n], &descriptors, "", "", 0).unwrap()
}

/// Hydrogen expansion with a fixed width and C_2 switched off
#[fixture]
fn hydrogen() -> FitSpec {
    FitSpec::from_descriptors(
        &[1.0079, 16.0],
        "function=GramCharlier,width=5,hermite_coeffs=[1,0,1],k_free=0,sears_flag=1;\
         function=Gaussian,width=10",
        "function=Polynomial,order=1",
        "",
        0,
    )
    .unwrap()
}

#[fixture]
fn hydrogen_result() -> FitResult {
    result(vec![
        ParameterRow::new("f0.Width", 5.0, 0.1),
        ParameterRow::new("f0.FSECoeff", 0.589256, 0.0),
        ParameterRow::new("f0.C_0", 2.0, 0.1),
        ParameterRow::new("f0.C_4", 0.5, 0.05),
        ParameterRow::new("f1.Width", 10.0, 0.0),
        ParameterRow::new("f1.Intensity", 2.0, 0.2),
        ParameterRow::new("f2.A0", 0.125, 0.01),
        ParameterRow::new("f2.A1", -0.5, 0.02),
        ParameterRow::new("Cost function value", 1.1, 0.0),
    ])
}

#[rstest]
#[case(vec![1.0, 2.0, 3.0])] // case 1
#[case(vec![0.001, 1000.0])] // case 2
#[case(vec![5.0])] // case 3
#[case(vec![0.3, 0.3, 0.4, 7.1])] // case 4
fn areas_sum_to_one(#[case] areas: Vec<f64>) {
    let spec = gaussians(areas.len());
    let rows = areas
        .iter()
        .enumerate()
        .flat_map(|(i, area)| {
            [
                ParameterRow::new(&format!("f{i}.Width"), 10.0, 0.1),
                ParameterRow::new(&format!("f{i}.Intensity"), *area, 0.1 * area),
            ]
        })
        .collect();

    let summary = ResultTransformer::new(&spec).transform(&result(rows)).unwrap();
    let total = summary.components.iter().map(|c| c.area.value).sum::<f64>();

    assert!((total - 1.0).abs() < 1e-9);
    assert!(summary.components.iter().all(|c| c.area.error.is_finite()));
    assert!(summary.degeneracies.is_empty());
}

#[rstest]
fn two_equal_areas_share_the_error() {
    let spec = gaussians(2);
    let rows = vec![
        ParameterRow::new("f0.Width", 10.0, 0.1),
        ParameterRow::new("f0.Intensity", 1.0, 0.1),
        ParameterRow::new("f1.Width", 10.0, 0.1),
        ParameterRow::new("f1.Intensity", 1.0, 0.1),
    ];

    let summary = ResultTransformer::new(&spec).transform(&result(rows)).unwrap();

    // Both partial derivatives have magnitude 0.25
    let expected = (2.0 * (0.25f64 * 0.1).powi(2)).sqrt();
    for component in &summary.components {
        assert_eq!(component.area.value, 0.5);
        assert!((component.area.error - expected).abs() < 1e-4);
    }
}

#[rstest]
fn hermite_terms_are_normalised(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let summary = ResultTransformer::new(&hydrogen)
        .transform(&hydrogen_result)
        .unwrap();
    let h = &summary.components[0];

    assert_eq!(h.kind, ProfileKind::GramCharlier);
    assert_eq!(h.hermite.len(), 3);

    // C_0 is always exactly 1 after normalisation
    assert_eq!(h.hermite[0].coefficient.value, 1.0);
    assert_eq!(h.hermite[0].coefficient.error, 0.0);
    assert_eq!(h.hermite[0].reduced.value, 1.0);

    // Inactive terms are reported but never fitted
    assert!(!h.hermite[1].active);
    assert_eq!(h.hermite[1].coefficient.value, 0.0);

    // C_4 / C_0 and then over 2^4 * 2!
    let c4 = h.hermite[2];
    assert!(c4.active);
    assert!((c4.coefficient.value - 0.25).abs() < 1e-12);
    assert!((c4.coefficient.error - (0.05 * 2.0 - 0.1 * 0.5) / 4.0).abs() < 1e-12);
    assert!((c4.reduced.value - 0.25 / 32.0).abs() < 1e-12);

    // Areas are C_0 for the expansion and the intensity for the Gaussian
    assert!((h.area.value - 0.5).abs() < 1e-12);
    assert!((summary.components[1].area.value - 0.5).abs() < 1e-12);
}

#[rstest]
fn fixed_fse_follows_the_width(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let summary = ResultTransformer::new(&hydrogen)
        .transform(&hydrogen_result)
        .unwrap();
    let fse = summary.components[0].fse.unwrap();

    assert!((fse.value - 0.589256).abs() < 1e-6);
    assert!((fse.error - 0.0117851).abs() < 1e-7);
    assert_eq!(summary.components[1].fse, None);
}

#[rstest]
#[case("k_free=0,sears_flag=0", 0.0, 0.0)] // case 1
#[case("k_free=1", 0.3 / 2.0, (0.02 * 2.0 - 0.1 * 0.3) / 4.0)] // case 2
fn fse_modes(#[case] flags: &str, #[case] value: f64, #[case] error: f64) {
    let spec = FitSpec::from_descriptors(
        &[1.0079],
        &format!("function=GramCharlier,width=[2, 5, 7],hermite_coeffs=[1],{flags}"),
        "",
        "",
        0,
    )
    .unwrap();
    let rows = vec![
        ParameterRow::new("f0.Width", 5.0, 0.1),
        ParameterRow::new("f0.FSECoeff", 0.3, 0.02),
        ParameterRow::new("f0.C_0", 2.0, 0.1),
    ];

    let summary = ResultTransformer::new(&spec).transform(&result(rows)).unwrap();
    let fse = summary.components[0].fse.unwrap();

    assert!((fse.value - value).abs() < 1e-12);
    assert!((fse.error - error).abs() < 1e-12);
}

#[rstest]
fn background_coefficients(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let summary = ResultTransformer::new(&hydrogen)
        .transform(&hydrogen_result)
        .unwrap();
    let background = summary.background.unwrap();

    assert_eq!(background.order, 1);
    assert_eq!(background.coefficients[0].value, 0.125);
    assert_eq!(background.coefficients[1].value, -0.5);
}

#[rstest]
fn zero_c0_is_flagged() {
    let spec = FitSpec::from_descriptors(
        &[1.0079],
        "function=GramCharlier,width=5,hermite_coeffs=[1,1],k_free=0,sears_flag=1",
        "",
        "",
        0,
    )
    .unwrap();
    let rows = vec![
        ParameterRow::new("f0.Width", 5.0, 0.1),
        ParameterRow::new("f0.C_0", 0.0, 0.1),
        ParameterRow::new("f0.C_2", 0.4, 0.05),
    ];

    let summary = ResultTransformer::new(&spec).transform(&result(rows)).unwrap();

    assert!(summary.is_degenerate());
    assert_eq!(
        summary.degeneracies,
        vec![Degeneracy::ZeroTotalArea, Degeneracy::ZeroC0 { component: 0 }]
    );

    // Divided by 1 instead
    let c2 = summary.components[0].hermite[1];
    assert!((c2.coefficient.value - 0.4).abs() < 1e-12);
    assert!(summary.components[0].area.value.is_finite());
}

#[rstest]
fn raw_table_is_left_alone(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let before = hydrogen_result.clone();
    let transformer = ResultTransformer::new(&hydrogen);

    let first = transformer.transform(&hydrogen_result).unwrap();
    let second = transformer.transform(&hydrogen_result).unwrap();

    assert_eq!(hydrogen_result, before);
    assert_eq!(first, second);
}

#[rstest]
fn missing_rows_are_errors(hydrogen: FitSpec) {
    let rows = vec![
        ParameterRow::new("f0.Width", 5.0, 0.1),
        ParameterRow::new("f1.Width", 10.0, 0.0),
        ParameterRow::new("f1.Intensity", 2.0, 0.2),
    ];
    let error = ResultTransformer::new(&hydrogen)
        .transform(&result(rows))
        .unwrap_err();

    assert!(matches!(error, Error::MissingRow { component: 0, .. }));
}

#[rstest]
fn rows_beyond_the_model_are_errors() {
    let spec = gaussians(1);
    let rows = vec![
        ParameterRow::new("f0.Width", 10.0, 0.1),
        ParameterRow::new("f0.Intensity", 1.0, 0.1),
        ParameterRow::new("f3.Width", 10.0, 0.1),
    ];
    let error = ResultTransformer::new(&spec)
        .transform(&result(rows))
        .unwrap_err();

    assert!(matches!(error, Error::IndexOutOfRange { index: 3, count: 1, .. }));
}

#[rstest]
fn invalid_perturbation(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let transformer =
        ResultTransformer::new(&hydrogen).with_options(TransformOptions { perturbation: -0.01 });
    assert!(matches!(
        transformer.transform(&hydrogen_result),
        Err(Error::InvalidPerturbation(_))
    ));
}

#[rstest]
fn text_report(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let summary = ResultTransformer::new(&hydrogen)
        .transform(&hydrogen_result)
        .unwrap();
    let report = summary.to_string();

    assert!(report.starts_with("Reduced Chi-Square = 1.100000"));
    assert!(report.contains("The mass M(1)=1.007900"));
    assert!(report.contains("St. dev. of momentum distr. = 5.000000 +/- 0.100000"));
    assert!(report.contains("Hermite polynomial expansion coefficient c0 = 1.000000 +/- 0.000000"));

    // Highest order background term first
    let first = report.find("Polynomial coefficient order 1").unwrap();
    let last = report.find("Polynomial coefficient order 0").unwrap();
    assert!(first < last);
}

#[rstest]
fn json_export(hydrogen: FitSpec, hydrogen_result: FitResult) {
    let summary = ResultTransformer::new(&hydrogen)
        .transform(&hydrogen_result)
        .unwrap();
    let json = summary.to_json().unwrap();

    assert!(json.contains("\"reduced_chi_square\": 1.1"));
    assert!(json.contains("\"degeneracies\": []"));
    assert!(json.contains("\"GramCharlier\""));
}
