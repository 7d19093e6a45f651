mod common;

#[cfg(test)]
pub mod funnel_tests {
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use std::time::Duration;

    use super::common::*;

    use wildfire_leads::common::*;
    use wildfire_leads::funnel::*;
    use wildfire_leads::models::*;

    const MIN_DISPLAY: Duration = Duration::from_millis(4000);

    fn t0() -> DateTime<Utc> {
        parse_time("2025-01-20 10:00:00+00")
    }

    fn at_name_step() -> FunnelController {
        let mut funnel = FunnelController::new(attribution_fb());
        funnel.select(Selection::Owner(OwnerType::Homeowner)).unwrap();
        funnel.select(Selection::Damage(PropertyDamage::Smoke)).unwrap();
        funnel.select(Selection::Injury(InjuredStatus::NotInjured)).unwrap();
        funnel
    }

    fn at_contact_step() -> FunnelController {
        let mut funnel = at_name_step();
        funnel.submit_name("Alex", "Kim").unwrap();
        funnel
            .attach_summary("Great job Alex.".to_string(), t0(), MIN_DISPLAY)
            .unwrap();
        funnel.advance(t0() + ChronoDuration::seconds(5)).unwrap();
        funnel
    }

    fn contact(email: &str, phone: &str) -> ContactInput {
        ContactInput {
            email: email.to_string(),
            phone: phone.to_string(),
            tcpa_consent: true,
        }
    }

    #[test]
    fn test_new_funnel_starts_at_first_step() {
        let funnel = FunnelController::new(attribution_fb());

        assert_eq!(funnel.step(), FunnelStep::OwnerType);
        assert_eq!(funnel.progress(), (1, STEP_COUNT));
        assert_eq!(funnel.draft().attribution, attribution_fb());
        assert_eq!(funnel.lead_id(), None);
        assert!(!funnel.is_submitted());
    }

    #[test]
    fn test_advance_fails_without_selection() {
        let mut funnel = FunnelController::new(Attribution::default());
        let before = funnel.clone();

        let err = funnel.advance(t0()).unwrap_err();

        assert_eq!(err.issues()[0].field, "ownerType");
        assert_eq!(funnel, before);
    }

    #[test]
    fn test_select_records_answer_and_advances() {
        let mut funnel = FunnelController::new(Attribution::default());

        let step = funnel.select(Selection::Owner(OwnerType::Renter)).unwrap();

        assert_eq!(step, FunnelStep::PropertyDamage);
        assert_eq!(funnel.draft().owner_type, Some(OwnerType::Renter));
    }

    #[test]
    fn test_select_fails_on_wrong_step() {
        let mut funnel = FunnelController::new(Attribution::default());
        let before = funnel.clone();

        let err = funnel
            .select(Selection::Injury(InjuredStatus::Injured))
            .unwrap_err();

        assert_eq!(err, StepError::WrongStep);
        assert_eq!(funnel, before);
    }

    #[test]
    fn test_retreat_keeps_answers() {
        let mut funnel = at_name_step();

        assert_eq!(funnel.retreat().unwrap(), FunnelStep::InjuredStatus);
        assert_eq!(funnel.retreat().unwrap(), FunnelStep::PropertyDamage);
        assert_eq!(funnel.draft().injured_status, Some(InjuredStatus::NotInjured));

        funnel.retreat().unwrap();
        assert_eq!(funnel.retreat().unwrap(), FunnelStep::OwnerType);
        assert_eq!(funnel.draft().owner_type, Some(OwnerType::Homeowner));
    }

    #[test]
    fn test_reselecting_after_retreat_overwrites() {
        let mut funnel = at_name_step();
        funnel.retreat().unwrap();

        funnel.select(Selection::Injury(InjuredStatus::Injured)).unwrap();

        assert_eq!(funnel.step(), FunnelStep::Name);
        assert_eq!(funnel.draft().injured_status, Some(InjuredStatus::Injured));
    }

    #[test]
    fn test_submit_name_fails_on_blank_names() {
        let mut funnel = at_name_step();

        let err = funnel.submit_name(" ", "").unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();

        assert_eq!(fields, vec!["firstName", "lastName"]);
        assert_eq!(funnel.step(), FunnelStep::Name);
    }

    #[test]
    fn test_summary_gate_blocks_until_min_display() {
        let mut funnel = at_name_step();
        funnel.submit_name(" Alex ", "Kim").unwrap();
        assert_eq!(funnel.step(), FunnelStep::Summary);
        assert_eq!(funnel.draft().first_name, "Alex");

        assert_eq!(funnel.summary_gate(t0()), SummaryGate::Generating);
        assert_eq!(funnel.advance(t0()).unwrap_err(), StepError::SummaryPending);

        funnel
            .attach_summary("Great job Alex.".to_string(), t0(), MIN_DISPLAY)
            .unwrap();

        let one_second_in = t0() + ChronoDuration::seconds(1);
        assert_eq!(
            funnel.summary_gate(one_second_in),
            SummaryGate::Waiting {
                remaining: Duration::from_secs(3)
            }
        );
        assert_eq!(
            funnel.advance(one_second_in).unwrap_err(),
            StepError::SummaryPending
        );

        let ready_at = t0() + ChronoDuration::milliseconds(4000);
        assert_eq!(funnel.summary_gate(ready_at), SummaryGate::Ready);
        assert_eq!(funnel.advance(ready_at).unwrap(), FunnelStep::Contact);
    }

    #[test]
    fn test_resubmitting_name_requires_fresh_summary() {
        let mut funnel = at_contact_step();
        funnel.retreat().unwrap();
        funnel.retreat().unwrap();

        funnel.submit_name("Alexis", "Kim").unwrap();

        assert_eq!(funnel.summary_gate(t0()), SummaryGate::Generating);
    }

    #[test]
    fn test_attach_summary_fails_off_summary_step() {
        let mut funnel = at_name_step();

        let err = funnel
            .attach_summary("text".to_string(), t0(), MIN_DISPLAY)
            .unwrap_err();

        assert_eq!(err, StepError::WrongStep);
        assert_eq!(funnel.draft().summary, None);
    }

    #[test]
    fn test_prepare_submission_fails_on_invalid_contact() {
        let mut funnel = at_contact_step();
        let before = funnel.clone();

        let err = funnel
            .prepare_submission(&contact("alex@example", "555-1234"))
            .unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();

        assert_eq!(fields, vec!["email", "phone"]);
        assert_eq!(funnel, before);
    }

    #[test]
    fn test_prepare_submission_success_normalizes_phone() {
        let mut funnel = at_contact_step();

        let lead = funnel
            .prepare_submission(&contact("alex@example.com", "(555) 123-4567 ext"))
            .unwrap();

        assert_eq!(lead.draft().phone, "5551234567");
        assert_eq!(lead.draft().summary.as_deref(), Some("Great job Alex."));
        assert_eq!(funnel.draft().phone, "5551234567");
        assert!(!funnel.is_submitted());
    }

    fn answered(draft: &LeadDraft, step: FunnelStep) -> bool {
        match step {
            FunnelStep::OwnerType => draft.owner_type.is_some(),
            FunnelStep::PropertyDamage => draft.property_damage.is_some(),
            FunnelStep::InjuredStatus => draft.injured_status.is_some(),
            FunnelStep::Name => {
                !draft.first_name.is_empty() || !draft.last_name.is_empty()
            }
            FunnelStep::Summary => draft.summary.is_some(),
            FunnelStep::Contact => {
                !draft.email.is_empty() || !draft.phone.is_empty()
            }
        }
    }

    /// Steps before the current one are answered, the rest are untouched.
    fn assert_filled_in_order(funnel: &FunnelController) {
        for step in FunnelStep::ALL {
            assert_eq!(
                answered(funnel.draft(), step),
                step.index() < funnel.step().index(),
                "{:?} while on {:?}",
                step,
                funnel.step()
            );
        }
    }

    #[test]
    fn test_walk_fills_fields_in_step_order() {
        let mut funnel = FunnelController::new(attribution_fb());
        assert_filled_in_order(&funnel);

        funnel.select(Selection::Owner(OwnerType::Renter)).unwrap();
        assert_filled_in_order(&funnel);
        funnel.select(Selection::Damage(PropertyDamage::Destroyed)).unwrap();
        assert_filled_in_order(&funnel);
        funnel.select(Selection::Injury(InjuredStatus::Injured)).unwrap();
        assert_filled_in_order(&funnel);

        funnel.submit_name("Dana", "Reyes").unwrap();
        assert_eq!(funnel.step(), FunnelStep::Summary);
        assert_filled_in_order(&funnel);

        funnel
            .attach_summary("Great job Dana.".to_string(), t0(), MIN_DISPLAY)
            .unwrap();
        funnel.advance(t0() + ChronoDuration::seconds(5)).unwrap();
        assert_eq!(funnel.step(), FunnelStep::Contact);
        assert_filled_in_order(&funnel);

        funnel
            .prepare_submission(&contact("dana@example.com", "5551234567"))
            .unwrap();
        for step in FunnelStep::ALL {
            assert!(answered(funnel.draft(), step), "{:?}", step);
        }
    }

    #[test]
    fn test_mark_submitted_is_terminal() {
        let mut funnel = at_contact_step();
        funnel
            .prepare_submission(&contact("alex@example.com", "5551234567"))
            .unwrap();
        let id = seed_id(9);

        funnel.mark_submitted(id).unwrap();

        assert!(funnel.is_submitted());
        assert_eq!(funnel.lead_id(), Some(id));
        assert_eq!(funnel.retreat().unwrap_err(), StepError::Submitted);
        assert_eq!(
            funnel
                .prepare_submission(&contact("alex@example.com", "5551234567"))
                .unwrap_err(),
            StepError::Submitted
        );
    }

    #[test]
    fn test_state_survives_serialization() {
        let mut funnel = at_contact_step();
        funnel.remember_lead_id(seed_id(1));

        let json = serde_json::to_string(&funnel).unwrap();
        let restored: FunnelController = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, funnel);
        assert!(restored.is_consistent());
    }

    #[test]
    fn test_is_consistent_fails_on_skipped_steps() {
        let mut funnel = FunnelController::new(Attribution::default());
        let mut json = serde_json::to_value(&funnel).unwrap();
        json["step"] = serde_json::json!("contact");

        funnel = serde_json::from_value(json).unwrap();

        assert_eq!(funnel.step(), FunnelStep::Contact);
        assert!(!funnel.is_consistent());
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!(
            Selection::parse("propertyDamage", "evac_only"),
            Ok(Selection::Damage(PropertyDamage::EvacOnly))
        );
        assert_eq!(
            Selection::parse("ownerType", "Landlord").unwrap_err().field,
            "ownerType"
        );
        assert!(Selection::parse("favoriteColor", "red").is_err());
    }

    #[test]
    fn test_step_kinds() {
        assert_eq!(FunnelStep::OwnerType.kind(), StepKind::Selection);
        assert_eq!(FunnelStep::Name.kind(), StepKind::FreeText);
        assert_eq!(FunnelStep::Summary.kind(), StepKind::Summary);
        assert_eq!(FunnelStep::Contact.kind(), StepKind::Submit);
        assert!(FunnelStep::Contact.is_last());
        assert_eq!(FunnelStep::Contact.next(), FunnelStep::Contact);
        assert_eq!(FunnelStep::OwnerType.prev(), FunnelStep::OwnerType);
    }
}
