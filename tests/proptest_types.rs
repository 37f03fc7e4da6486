//! Property-based tests using proptest
//!
//! These tests verify parsing and formatting of domain values and the
//! planning rules using randomized inputs.

use pinecone_provider::pinecone::{MetadataConfig, Metric, PodClass, PodSize, PodType};
use pinecone_provider::resource::{plan, IndexConfig, IndexState, Plan};
use proptest::prelude::*;

fn arb_pod_type() -> impl Strategy<Value = PodType> {
    (
        prop::sample::select(PodClass::ALL.to_vec()),
        prop::sample::select(PodSize::ALL.to_vec()),
    )
        .prop_map(|(class, size)| PodType::new(class, size))
}

fn arb_metric() -> impl Strategy<Value = Metric> {
    prop::sample::select(Metric::ALL.to_vec())
}

fn arb_state() -> impl Strategy<Value = IndexState> {
    (
        "[a-z][a-z0-9-]{0,44}",
        1i64..20_000,
        arb_metric(),
        1i64..10,
        1i64..10,
        arb_pod_type(),
    )
        .prop_map(|(name, dimension, metric, pods, replicas, pod_type)| IndexState {
            id: name.clone(),
            name,
            dimension,
            metric,
            pods,
            replicas,
            pod_type,
            metadata_config: Some(MetadataConfig::new(["genre"])),
            last_updated: None,
        })
}

fn desired_from(state: &IndexState) -> IndexConfig {
    IndexConfig {
        metric: Some(state.metric.to_string()),
        pods: Some(state.pods),
        replicas: Some(state.replicas),
        pod_type: Some(state.pod_type.to_string()),
        metadata_config: state.metadata_config.clone(),
        ..IndexConfig::new(&state.name, state.dimension)
    }
}

mod pod_type_tests {
    use super::*;

    proptest! {
        /// Formatting then parsing yields the same pod type
        #[test]
        fn format_parse_identity(pod_type in arb_pod_type()) {
            let parsed: PodType = pod_type.to_string().parse().unwrap();
            prop_assert_eq!(parsed, pod_type);
        }

        /// Anything outside the class/size grid is rejected
        #[test]
        fn unknown_strings_rejected(s in "[a-z0-9.]{0,10}") {
            let valid = PodClass::ALL.iter().any(|c| {
                PodSize::ALL.iter().any(|z| format!("{}.{}", c.as_str(), z.as_str()) == s)
            });
            prop_assert_eq!(s.parse::<PodType>().is_ok(), valid);
        }

        /// Extra segments are never accepted
        #[test]
        fn extra_segments_rejected(pod_type in arb_pod_type(), suffix in "[a-z0-9]{0,3}") {
            let s = format!("{}.{}", pod_type, suffix);
            prop_assert!(s.parse::<PodType>().is_err());
        }
    }

    #[test]
    fn test_grid_has_twelve_values() {
        let all: std::collections::HashSet<String> = PodClass::ALL
            .iter()
            .flat_map(|c| PodSize::ALL.iter().map(move |z| PodType::new(*c, *z).to_string()))
            .collect();
        assert_eq!(all.len(), 12);
    }
}

mod metric_tests {
    use super::*;

    proptest! {
        /// Name and code both round trip
        #[test]
        fn metric_round_trip(metric in arb_metric()) {
            prop_assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
            prop_assert_eq!(Metric::try_from(metric.code()).unwrap(), metric);
        }

        /// Codes outside the declared range have no metric
        #[test]
        fn out_of_range_codes_rejected(code in prop_oneof![i64::MIN..0i64, 3i64..i64::MAX]) {
            prop_assert!(Metric::try_from(code).is_err());
        }

        /// Names are case sensitive and closed
        #[test]
        fn unknown_names_rejected(s in "[A-Za-z]{0,12}") {
            let known = ["euclidean", "cosine", "dotproduct"].contains(&s.as_str());
            prop_assert_eq!(s.parse::<Metric>().is_ok(), known);
        }
    }
}

mod plan_tests {
    use super::*;

    proptest! {
        /// Desired state mirroring prior state needs no action
        #[test]
        fn unchanged_is_noop(state in arb_state()) {
            prop_assert_eq!(plan(Some(&state), &desired_from(&state)), Plan::NoOp);
        }

        /// Replica and pod type changes alone never force replacement
        #[test]
        fn scaling_is_in_place(state in arb_state(), replicas in 1i64..10, pod_type in arb_pod_type()) {
            let desired = IndexConfig {
                replicas: Some(replicas),
                pod_type: Some(pod_type.to_string()),
                ..desired_from(&state)
            };
            match plan(Some(&state), &desired) {
                Plan::NoOp => prop_assert!(replicas == state.replicas && pod_type == state.pod_type),
                Plan::Update(fields) => prop_assert!(fields.iter().all(|f| *f == "replicas" || *f == "pod_type")),
                other => prop_assert!(false, "unexpected plan {:?}", other),
            }
        }

        /// A dimension change always forces replacement
        #[test]
        fn dimension_change_replaces(state in arb_state(), delta in 1i64..100) {
            let desired = IndexConfig {
                dimension: state.dimension + delta,
                ..desired_from(&state)
            };
            prop_assert_eq!(plan(Some(&state), &desired), Plan::Replace(vec!["dimension"]));
        }
    }
}
