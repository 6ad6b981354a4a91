use crate::models::ActionType;

/// Keyword table in priority order. The first row with any keyword contained
/// in the upper-cased subject decides the type, so the generic DIVIDEND row
/// must stay below SPLIT and BONUS.
pub const KEYWORD_TABLE: &[(ActionType, &[&str])] = &[
    (ActionType::Split, &["SPLIT", "SUB-DIVISION"]),
    (ActionType::Bonus, &["BONUS"]),
    (ActionType::Dividend, &["DIVIDEND", "DIV"]),
    (ActionType::Rights, &["RIGHTS"]),
    (ActionType::Merger, &["MERGER", "AMALGAMATION"]),
    (ActionType::NameChange, &["NAME CHANGE", "SYMBOL CHANGE", "SYMBOL"]),
];

pub fn classify(subject_text: &str) -> ActionType {
    let subject = subject_text.to_uppercase();
    KEYWORD_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| subject.contains(keyword)))
        .map(|(action_type, _)| *action_type)
        .unwrap_or(ActionType::Other)
}

pub fn build_detail(action_type: ActionType, subject_text: &str, amount_text: Option<&str>) -> String {
    let amount = amount_text.map(str::trim).filter(|value| !value.is_empty());
    let numeric = amount.filter(|value| value.parse::<f64>().is_ok_and(f64::is_finite));

    match action_type {
        ActionType::Dividend => match numeric {
            Some(value) => format!("Amount: {value}"),
            None => subject_text.to_string(),
        },
        ActionType::Bonus | ActionType::Rights => match amount {
            Some(value) => format!("Ratio: {value}"),
            None => subject_text.to_string(),
        },
        ActionType::Split => match numeric {
            Some(value) => format!("Ratio: {value}:1"),
            None => subject_text.to_string(),
        },
        ActionType::Merger | ActionType::NameChange | ActionType::Other => {
            subject_text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_wins_over_dividend() {
        assert_eq!(classify("Stock split and interim dividend"), ActionType::Split);
        assert_eq!(
            classify("Stock Split - Sub-Division of shares from Rs 10 to Rs 2"),
            ActionType::Split
        );
    }

    #[test]
    fn bonus_wins_over_dividend() {
        assert_eq!(classify("Bonus issue 1:1 and dividend"), ActionType::Bonus);
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(classify("final dividend rs 5.50 per share"), ActionType::Dividend);
        assert_eq!(classify("Int Div Rs 2"), ActionType::Dividend);
        assert_eq!(classify("Rights issue of equity shares"), ActionType::Rights);
        assert_eq!(classify("Scheme of Amalgamation"), ActionType::Merger);
        assert_eq!(classify("Change in company name"), ActionType::Other);
        assert_eq!(classify("Name Change from ABC to XYZ"), ActionType::NameChange);
        assert_eq!(classify("Symbol changed"), ActionType::NameChange);
    }

    #[test]
    fn unmatched_and_empty_subjects_are_other() {
        assert_eq!(classify(""), ActionType::Other);
        assert_eq!(classify("Annual General Meeting"), ActionType::Other);
        assert_eq!(classify("Buyback of shares"), ActionType::Other);
    }

    #[test]
    fn classification_is_deterministic() {
        let subject = "Final Dividend Rs 5.50 per share";
        assert_eq!(classify(subject), classify(subject));
    }

    #[test]
    fn table_keeps_priority_order() {
        let order: Vec<ActionType> = KEYWORD_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            order,
            vec![
                ActionType::Split,
                ActionType::Bonus,
                ActionType::Dividend,
                ActionType::Rights,
                ActionType::Merger,
                ActionType::NameChange,
            ]
        );
    }

    #[test]
    fn dividend_detail_uses_numeric_amount() {
        assert_eq!(
            build_detail(ActionType::Dividend, "Final Dividend Rs 5.50 per share", Some("5.50")),
            "Amount: 5.50"
        );
        assert_eq!(
            build_detail(ActionType::Dividend, "Final Dividend", Some("Rs 5.50")),
            "Final Dividend"
        );
        assert_eq!(build_detail(ActionType::Dividend, "Final Dividend", None), "Final Dividend");
    }

    #[test]
    fn ratio_details_follow_type() {
        assert_eq!(build_detail(ActionType::Bonus, "Bonus", Some("1:1")), "Ratio: 1:1");
        assert_eq!(build_detail(ActionType::Rights, "Rights", Some(" 3:10 ")), "Ratio: 3:10");
        assert_eq!(build_detail(ActionType::Rights, "Rights issue", None), "Rights issue");
        assert_eq!(build_detail(ActionType::Split, "Stock Split", Some("5")), "Ratio: 5:1");
        assert_eq!(build_detail(ActionType::Split, "Stock Split", Some("10 to 2")), "Stock Split");
        assert_eq!(build_detail(ActionType::Merger, "Merger with XYZ", Some("4")), "Merger with XYZ");
    }
}
