//! Integration tests for descriptor parsing, constraints and ties

use ncstools_profiles::{
    build_constraints, build_ties, join, parse_intensity_constraints, parse_profiles, Error,
    MassComponent, ParameterValues, WidthSpec,
};
use rstest::{fixture, rstest};

#[fixture]
fn mixed() -> Vec<MassComponent> {
    parse_profiles(
        &[1.0079, 16.0, 27.0],
        "function=GramCharlier,width=[2, 5, 7],hermite_coeffs=[1,0,1],k_free=0,sears_flag=1;
         function=Gaussian,width=10;
         function=Gaussian,width=[11, 13, 15];",
    )
    .unwrap()
}

#[rstest]
fn gram_charlier_tie_order() {
    let components = parse_profiles(
        &[1.0079],
        "function=GramCharlier,hermite_coeffs=[1,0,0],k_free=0,sears_flag=1,width=5",
    )
    .unwrap();
    assert_eq!(
        join(&build_ties(&components)),
        "f0.Width=5.000000,f0.FSECoeff=f0.Width*sqrt(2)/12"
    );
}

#[rstest]
fn mixed_constraints_and_ties(mixed: Vec<MassComponent>) {
    assert_eq!(
        join(&build_constraints(&mixed)),
        "2.000000 < f0.Width < 7.000000,11.000000 < f2.Width < 15.000000"
    );
    assert_eq!(
        join(&build_ties(&mixed)),
        "f0.FSECoeff=f0.Width*sqrt(2)/12,f1.Width=10.000000"
    );
}

#[rstest]
fn prefixes_follow_declaration_order(mixed: Vec<MassComponent>) {
    let reversed = mixed.iter().rev().cloned().collect::<Vec<MassComponent>>();
    let constraints = build_constraints(&reversed);
    assert_eq!(
        join(&constraints),
        "11.000000 < f0.Width < 15.000000,2.000000 < f2.Width < 7.000000"
    );
    assert_eq!(
        join(&build_ties(&reversed)),
        "f1.Width=10.000000,f2.FSECoeff=f2.Width*sqrt(2)/12"
    );
}

#[rstest]
fn reduced_render_skips_inactive_terms(mixed: Vec<MassComponent>) {
    let rendered = mixed[0].render("f0.", 0, None).unwrap();
    assert!(rendered.contains("HermiteCoeffs=1 0 1"));
    assert!(!rendered.contains("C_2"));
}

#[rstest]
fn all_free_render_only_uses_known_keys(mixed: Vec<MassComponent>) {
    let mut values = ParameterValues::new();
    for (index, component) in mixed.iter().enumerate() {
        for (name, value) in component.default_parameters(&format!("f{index}.")).iter() {
            values.insert(name, value);
        }
    }

    for (index, component) in mixed.iter().enumerate() {
        let fragment = component
            .fragment(&format!("f{index}."), 0, Some(&values))
            .unwrap();
        for (key, _) in &fragment.attributes {
            let numeric = !matches!(key.as_str(), "WorkspaceIndex" | "Mass" | "HermiteCoeffs");
            if numeric {
                assert!(values.contains(&format!("f{index}.{key}")), "{key}");
            }
        }
    }
}

#[rstest]
#[case("function=Gaussian,width=[1, 2]", Error::MalformedWidth(2))] // case 1
#[case("function=Gaussian,width=[1, 2, 3, 4]", Error::MalformedWidth(4))] // case 2
#[case("function=Gauss,width=1", Error::UnknownProfile("Gauss".to_string()))] // case 3
#[case("function=Gaussian,width=[5, 2, 7]", Error::UnorderedWidth { min: 5.0, default: 2.0, max: 7.0 })] // case 4
fn configuration_errors(#[case] descriptor: &str, #[case] expected: Error) {
    assert_eq!(parse_profiles(&[16.0], descriptor), Err(expected));
}

#[rstest]
#[case(&[16.0, 27.0], "function=Gaussian,width=10", 2, 1)] // case 1
#[case(&[16.0], "function=Gaussian,width=10;function=Gaussian,width=13", 1, 2)] // case 2
fn count_mismatch(
    #[case] masses: &[f64],
    #[case] profiles: &str,
    #[case] n_masses: usize,
    #[case] n_profiles: usize,
) {
    assert_eq!(
        parse_profiles(masses, profiles),
        Err(Error::CountMismatch {
            masses: n_masses,
            profiles: n_profiles
        })
    );
}

#[rstest]
fn empty_inputs() {
    assert_eq!(parse_profiles(&[], "function=Gaussian,width=1"), Err(Error::EmptyMasses));
    assert_eq!(parse_profiles(&[16.0], "  "), Err(Error::EmptyProfiles));
}

#[rstest]
fn descriptors_round_trip(mixed: Vec<MassComponent>) {
    let masses = mixed.iter().map(|c| c.mass()).collect::<Vec<f64>>();
    let text = mixed
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<String>>()
        .join(";");
    assert_eq!(parse_profiles(&masses, &text).unwrap(), mixed);
}

#[rstest]
fn multiple_intensity_constraints() {
    let constraints = parse_intensity_constraints("[0, 1, 0, -4];[1, -1, 0, 0];")
        .unwrap()
        .unwrap();
    assert_eq!(constraints.nrows(), 2);
    assert_eq!(
        constraints.render(),
        "\"Matrix(2|4)0.000000|1.000000|0.000000|-4.000000|1.000000|-1.000000|0.000000|0.000000\""
    );
}

#[rstest]
fn fixed_width_is_scalar() {
    let components = parse_profiles(&[16.0], "function=Gaussian,width=[10]").unwrap();
    assert_eq!(components[0].width(), &WidthSpec::Fixed(10.0));
}
