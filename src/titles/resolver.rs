//! Title Resolution
//!
//! Maps a user's primary group and trust level to a display title through the
//! configured rule set. The resolver is pure: it decides, the caller acts.
//! All persistence and logging happen in [`crate::titles::engine`], and only
//! on a [`TitleDecision::SetTitle`] outcome.
//!
//! Every malformed or missing input degrades to [`TitleDecision::NoChange`].
//! Bad configuration or a half-populated user record must never abort event
//! processing for other users, so no error path exists here at all.

use super::rules::RuleSet;

/// Per-invocation view of the user being evaluated.
///
/// Built by the caller from the user record immediately before [`resolve`]
/// and discarded right after; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct UserTitleContext {
    /// Name of the user's primary group, if one is assigned.
    pub primary_group: Option<String>,
    /// Trust level rank. Only values 1 through 4 can yield a title.
    pub trust_level: u8,
    /// The title currently stored on the user record.
    pub current_title: Option<String>,
}

/// Outcome of one resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleDecision {
    /// Leave the user record untouched; the caller performs no side effect.
    NoChange,
    /// Persist this string as the user's new display title.
    SetTitle(String),
}

/// Resolve the title for one user against the configured rule set.
///
/// Decision order:
/// 1. disabled feature, absent/empty primary group, or empty rule set
/// 2. first rule whose group name matches (case-insensitive, trimmed) wins
/// 3. a matched rule without title fields yields nothing
/// 4. trust level *n* selects the *n*-th title field; out of range or absent
///    fields yield nothing
/// 5. a blank resolved title yields nothing (an existing title is never
///    force-cleared)
/// 6. a resolved title equal to the current one yields nothing (no redundant
///    write)
pub fn resolve(context: &UserTitleContext, rules: &RuleSet, enabled: bool) -> TitleDecision {
    if !enabled {
        return TitleDecision::NoChange;
    }

    let group = match context.primary_group.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return TitleDecision::NoChange,
    };

    if rules.is_empty() {
        return TitleDecision::NoChange;
    }

    // First match is authoritative even when malformed: a group-only rule
    // line shadows later rules for the same group.
    let rule = match rules.find_group(group) {
        Some(rule) => rule,
        None => return TitleDecision::NoChange,
    };

    let new_title = match rule.title_for(context.trust_level) {
        Some(title) if !title.is_empty() => title,
        _ => return TitleDecision::NoChange,
    };

    if context.current_title.as_deref() == Some(new_title) {
        return TitleDecision::NoChange;
    }

    TitleDecision::SetTitle(new_title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_rules() -> RuleSet {
        RuleSet::parse(["Staff|Jr|Sr|Lead|Chief"])
    }

    fn context(group: Option<&str>, trust_level: u8, title: Option<&str>) -> UserTitleContext {
        UserTitleContext {
            primary_group: group.map(str::to_string),
            trust_level,
            current_title: title.map(str::to_string),
        }
    }

    #[test]
    fn assigns_title_for_matching_group_and_level() {
        let decision = resolve(&context(Some("Staff"), 2, Some("Jr")), &staff_rules(), true);
        assert_eq!(decision, TitleDecision::SetTitle("Sr".to_string()));
    }

    #[test]
    fn idempotent_when_title_already_current() {
        let decision = resolve(&context(Some("Staff"), 2, Some("Sr")), &staff_rules(), true);
        assert_eq!(decision, TitleDecision::NoChange);
    }

    #[test]
    fn no_matching_rule_changes_nothing() {
        let decision = resolve(&context(Some("Member"), 2, None), &staff_rules(), true);
        assert_eq!(decision, TitleDecision::NoChange);
    }

    #[test]
    fn trust_level_zero_and_above_four_change_nothing() {
        for level in [0u8, 5, 42] {
            let decision = resolve(&context(Some("Staff"), level, None), &staff_rules(), true);
            assert_eq!(decision, TitleDecision::NoChange, "level {}", level);
        }
    }

    #[test]
    fn disabled_feature_overrides_any_match() {
        let decision = resolve(&context(Some("Staff"), 2, Some("Jr")), &staff_rules(), false);
        assert_eq!(decision, TitleDecision::NoChange);
    }

    #[test]
    fn empty_rule_set_changes_nothing() {
        let rules = RuleSet::parse(Vec::<String>::new());
        let decision = resolve(&context(Some("Staff"), 2, None), &rules, true);
        assert_eq!(decision, TitleDecision::NoChange);
    }

    #[test]
    fn absent_or_blank_primary_group_changes_nothing() {
        let rules = staff_rules();
        assert_eq!(resolve(&context(None, 2, None), &rules, true), TitleDecision::NoChange);
        assert_eq!(
            resolve(&context(Some("   "), 2, None), &rules, true),
            TitleDecision::NoChange
        );
    }

    #[test]
    fn group_match_ignores_case_and_whitespace() {
        let decision = resolve(&context(Some("  staff "), 1, None), &staff_rules(), true);
        assert_eq!(decision, TitleDecision::SetTitle("Jr".to_string()));
    }

    #[test]
    fn first_match_wins_over_later_duplicates() {
        let rules = RuleSet::parse(["Staff|Alpha|Beta", "staff|Gamma|Delta"]);
        let decision = resolve(&context(Some("Staff"), 2, None), &rules, true);
        assert_eq!(decision, TitleDecision::SetTitle("Beta".to_string()));
    }

    #[test]
    fn malformed_first_match_shadows_later_valid_rule() {
        let rules = RuleSet::parse(["Staff", "staff|Gamma"]);
        let decision = resolve(&context(Some("Staff"), 1, None), &rules, true);
        assert_eq!(decision, TitleDecision::NoChange);
    }

    #[test]
    fn absent_title_field_changes_nothing() {
        let rules = RuleSet::parse(["Staff|Jr|Sr"]);
        let decision = resolve(&context(Some("Staff"), 3, None), &rules, true);
        assert_eq!(decision, TitleDecision::NoChange);
    }

    #[test]
    fn blank_title_field_never_clears_existing_title() {
        let rules = RuleSet::parse(["Staff|Jr||Lead"]);
        let decision = resolve(&context(Some("Staff"), 2, Some("Sr")), &rules, true);
        assert_eq!(decision, TitleDecision::NoChange);
    }
}
