mod common;

use common::{bracket, match_at, team_ids};
use pickleball_bracket_web::{
    build_bracket, check_stop, winner_round_count, BracketConfig, BracketType, EngineError,
    GameSlot,
};

#[test]
fn winner_round_counts() {
    assert_eq!(winner_round_count(2), 1);
    assert_eq!(winner_round_count(3), 2);
    assert_eq!(winner_round_count(4), 2);
    assert_eq!(winner_round_count(5), 3);
    assert_eq!(winner_round_count(8), 3);
    assert_eq!(winner_round_count(9), 4);
    assert_eq!(winner_round_count(16), 4);
    assert_eq!(winner_round_count(17), 5);
}

#[test]
fn round_shape_holds_for_all_sizes() {
    for n in 2..=64 {
        let (stop, _) = bracket(n);
        let w = winner_round_count(n);
        assert_eq!(
            stop.rounds_in(BracketType::Winner).count(),
            w,
            "{} teams: winner rounds",
            n
        );
        assert_eq!(
            stop.rounds_in(BracketType::Loser).count(),
            2 * w - 1,
            "{} teams: loser rounds",
            n
        );
        assert_eq!(
            stop.rounds_in(BracketType::Finals).count(),
            2,
            "{} teams: finals rounds",
            n
        );
        let findings = check_stop(&stop);
        assert!(
            findings.is_empty(),
            "{} teams: diagnostics found {:?}",
            n,
            findings
        );
    }
}

#[test]
fn first_round_pairs_follow_fold_order() {
    let (stop, teams) = bracket(8);
    let expect = [(0usize, 7usize), (3, 4), (1, 6), (2, 5)];
    for (pos, &(a, b)) in expect.iter().enumerate() {
        let id = match_at(&stop, BracketType::Winner, 0, pos);
        let m = stop.get_match(id).unwrap();
        assert_eq!(m.team_a, Some(teams[a]), "match {} side A", pos);
        assert_eq!(m.team_b, Some(teams[b]), "match {} side B", pos);
        assert_eq!(m.seed_a, Some(a + 1));
        assert_eq!(m.seed_b, Some(b + 1));
    }
}

#[test]
fn odd_team_count_byes_resolve_at_build() {
    // 5 teams in an 8 slot bracket: seeds 6, 7, 8 are absent.
    let (stop, teams) = bracket(5);

    // (1 vs 8), (2 vs 7), (3 vs 6) are byes and resolve immediately.
    for (pos, seed) in [(0usize, 0usize), (2, 1), (3, 2)] {
        let id = match_at(&stop, BracketType::Winner, 0, pos);
        let m = stop.get_match(id).unwrap();
        assert!(m.is_bye, "match {} should be a bye", pos);
        assert!(m.resolved);
        assert_eq!(m.winner_id, Some(teams[seed]));
        assert!(m.games.is_empty(), "byes take no games");
    }

    // (4 vs 5) is the only playable first-round match.
    let playable = stop
        .get_match(match_at(&stop, BracketType::Winner, 0, 1))
        .unwrap();
    assert!(!playable.is_bye);
    assert_eq!(playable.team_a, Some(teams[3]));
    assert_eq!(playable.team_b, Some(teams[4]));

    // Second round: seed 1 waits on the 4/5 winner; seeds 2 and 3 meet now.
    let semi0 = stop
        .get_match(match_at(&stop, BracketType::Winner, 1, 0))
        .unwrap();
    assert_eq!(semi0.team_a, Some(teams[0]));
    assert_eq!(semi0.team_b, None);
    let semi1 = stop
        .get_match(match_at(&stop, BracketType::Winner, 1, 1))
        .unwrap();
    assert_eq!(semi1.team_a, Some(teams[1]));
    assert_eq!(semi1.team_b, Some(teams[2]));
    assert!(!semi1.is_bye);

    // A bye's loser slot is empty, so its drop-in match resolves as void.
    let void_drop = stop
        .get_match(match_at(&stop, BracketType::Loser, 0, 0))
        .unwrap();
    assert!(void_drop.resolved);
    assert_eq!(void_drop.winner_id, None);
}

#[test]
fn two_team_bracket_is_minimal() {
    let (stop, teams) = bracket(2);
    assert_eq!(stop.rounds_in(BracketType::Winner).count(), 1);
    assert_eq!(stop.rounds_in(BracketType::Loser).count(), 1);
    let wb = stop
        .get_match(match_at(&stop, BracketType::Winner, 0, 0))
        .unwrap();
    assert_eq!(wb.team_a, Some(teams[0]));
    assert_eq!(wb.team_b, Some(teams[1]));
    assert!(!wb.is_bye);
}

#[test]
fn playable_matches_carry_standard_slots_and_tiebreaker() {
    let (stop, _) = bracket(4);
    let id = match_at(&stop, BracketType::Winner, 0, 0);
    let m = stop.get_match(id).unwrap();
    assert_eq!(m.games.len(), 5);
    let slots: Vec<GameSlot> = m.games.iter().map(|g| g.slot).collect();
    assert_eq!(
        slots,
        vec![
            GameSlot::MensDoubles,
            GameSlot::WomensDoubles,
            GameSlot::Mixed1,
            GameSlot::Mixed2,
            GameSlot::Tiebreaker,
        ]
    );
}

#[test]
fn custom_slot_config_shrinks_lineup() {
    let teams = team_ids(4);
    let config = BracketConfig {
        game_slots: vec![GameSlot::MensDoubles, GameSlot::WomensDoubles],
    };
    let stop = build_bracket("Two Slot Stop", &teams, &config).unwrap();
    let first = stop.round_in(BracketType::Winner, 0).unwrap().matches[0];
    let m = stop.get_match(first).unwrap();
    // Two standard slots plus the tiebreaker.
    assert_eq!(m.games.len(), 3);
    assert!(m.games.last().unwrap().slot.is_tiebreaker());
}

#[test]
fn rejects_too_few_teams() {
    let err = build_bracket("Empty", &[], &BracketConfig::default()).unwrap_err();
    assert_eq!(err, EngineError::InvalidTopologyRequest { team_count: 0 });
    let one = team_ids(1);
    let err = build_bracket("Solo", &one, &BracketConfig::default()).unwrap_err();
    assert_eq!(err, EngineError::InvalidTopologyRequest { team_count: 1 });
}

#[test]
fn rejects_duplicate_teams() {
    let mut teams = team_ids(3);
    teams.push(teams[0]);
    let err = build_bracket("Dupes", &teams, &BracketConfig::default()).unwrap_err();
    assert_eq!(err, EngineError::DuplicateTeam(teams[0]));
}

#[test]
fn rejects_tiebreaker_only_config() {
    let teams = team_ids(4);
    let config = BracketConfig {
        game_slots: vec![GameSlot::Tiebreaker],
    };
    assert!(build_bracket("No Standard Slots", &teams, &config).is_err());
}

#[test]
fn losers_final_sources_winners_final() {
    let (stop, _) = bracket(8);
    let w = winner_round_count(8);
    let winners_final = match_at(&stop, BracketType::Winner, w - 1, 0);
    let losers_final = stop
        .round_in(BracketType::Loser, 2 * w - 2)
        .unwrap()
        .matches[0];
    let lf = stop.get_match(losers_final).unwrap();
    assert_eq!(lf.source_match_b, Some(winners_final));

    let finals1 = stop.finals_match(1).unwrap();
    let f1 = stop.get_match(finals1).unwrap();
    assert_eq!(f1.source_match_a, Some(winners_final));
    assert_eq!(f1.source_match_b, Some(losers_final));

    let finals2 = stop.finals_match(0).unwrap();
    let f2 = stop.get_match(finals2).unwrap();
    assert_eq!(f2.source_match_a, Some(finals1));
    assert_eq!(f2.source_match_b, Some(finals1));
}
