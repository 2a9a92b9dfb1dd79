//! End-to-end round lifecycle tests, driven through the engine handle under
//! paused tokio time. The sampler clamp is pinned per test so every round's
//! crash point is known in advance.

use liftoff::{
    CrashEngine, GameConfig, GameError, GameEvent, GameOutcome, InvalidBetReason, Multiplier,
    RoundPhase, SamplerConfig,
};
use tokio::sync::broadcast;

fn pinned_config(crash: f64) -> GameConfig {
    let mut config = GameConfig::accelerated();
    config.sampler = SamplerConfig {
        instant_bust_probability: 0.0,
        min_crash: crash,
        max_crash: crash,
    };
    config.seed = Some(99);
    config
}

fn mult(hundredths: u32) -> Multiplier {
    Multiplier::from_hundredths(hundredths)
}

async fn next_event(events: &mut broadcast::Receiver<GameEvent>) -> GameEvent {
    loop {
        match events.recv().await {
            Ok(event) => return event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("event stream closed"),
        }
    }
}

async fn wait_for_phase(events: &mut broadcast::Receiver<GameEvent>, wanted: RoundPhase) {
    loop {
        if let GameEvent::PhaseChanged { phase, .. } = next_event(events).await {
            if phase == wanted {
                return;
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn manual_cash_out_wins_and_round_continues() {
    let engine = CrashEngine::spawn(pinned_config(2.5)).unwrap();
    let mut events = engine.subscribe();

    wait_for_phase(&mut events, RoundPhase::Betting).await;
    assert_eq!(engine.place_bet(100, None).await.unwrap(), 9_900);
    wait_for_phase(&mut events, RoundPhase::Ascending).await;

    // Ride until 2.10x, then cash out manually.
    loop {
        if let GameEvent::MultiplierTick { multiplier, .. } = next_event(&mut events).await {
            if multiplier >= mult(210) {
                assert_eq!(multiplier, mult(210), "no tick may be skipped");
                break;
            }
        }
    }
    let settlement = engine.cash_out().await.unwrap();
    assert_eq!(settlement.outcome, GameOutcome::Win);
    assert_eq!(settlement.payout, 210);
    assert_eq!(engine.balance().await.unwrap(), 10_110);

    // Cashing out does not end the round; it still crashes at 2.50x.
    wait_for_phase(&mut events, RoundPhase::Crashed).await;
    let history = engine.round_history().await.unwrap();
    assert_eq!(history[0].crash_point, mult(250));

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn auto_cash_out_settles_before_the_crash() {
    let engine = CrashEngine::spawn(pinned_config(2.5)).unwrap();
    let mut events = engine.subscribe();

    wait_for_phase(&mut events, RoundPhase::Betting).await;
    engine.place_bet(50, Some(mult(200))).await.unwrap();

    // The win must arrive while the round is still ascending.
    loop {
        match next_event(&mut events).await {
            GameEvent::UserOutcomeLogged {
                outcome,
                payout,
                multiplier,
                ..
            } => {
                assert_eq!(outcome, GameOutcome::Win);
                assert_eq!(payout, 100);
                assert_eq!(multiplier, mult(200));
                break;
            }
            GameEvent::PhaseChanged {
                phase: RoundPhase::Crashed,
                ..
            } => panic!("crashed before the threshold settled"),
            _ => {}
        }
    }
    assert_eq!(engine.balance().await.unwrap(), 10_050);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unreached_threshold_settles_as_loss_at_crash() {
    let engine = CrashEngine::spawn(pinned_config(1.8)).unwrap();
    let mut events = engine.subscribe();

    wait_for_phase(&mut events, RoundPhase::Betting).await;
    engine.place_bet(50, Some(mult(300))).await.unwrap();

    let mut outcomes = Vec::new();
    loop {
        match next_event(&mut events).await {
            GameEvent::UserOutcomeLogged {
                outcome, bet_amount, ..
            } => outcomes.push((outcome, bet_amount)),
            GameEvent::RoundHistoryAppended { crash_point } => {
                assert_eq!(crash_point, mult(180));
                break;
            }
            _ => {}
        }
    }

    // Exactly one settlement, the loss of the stake.
    assert_eq!(outcomes, vec![(GameOutcome::Loss, 50)]);
    assert_eq!(engine.balance().await.unwrap(), 9_950);
    let bets = engine.bet_history().await.unwrap();
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].outcome, GameOutcome::Loss);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_betting_window_rearms_without_a_round() {
    let engine = CrashEngine::spawn(pinned_config(2.0)).unwrap();
    let mut events = engine.subscribe();

    wait_for_phase(&mut events, RoundPhase::Betting).await;

    // With no wager, the next phase event must be Betting again; no ascent,
    // no ticks, no sampled round in the history.
    loop {
        match next_event(&mut events).await {
            GameEvent::PhaseChanged {
                phase: RoundPhase::Betting,
                ..
            } => break,
            GameEvent::PhaseChanged { phase, .. } => panic!("unexpected phase: {phase}"),
            GameEvent::MultiplierTick { .. } => panic!("tick without a wager"),
            _ => {}
        }
    }
    assert!(engine.round_history().await.unwrap().is_empty());

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn late_actions_are_rejected_without_double_settling() {
    let engine = CrashEngine::spawn(pinned_config(1.01)).unwrap();
    let mut events = engine.subscribe();

    wait_for_phase(&mut events, RoundPhase::Betting).await;
    engine.place_bet(100, None).await.unwrap();
    wait_for_phase(&mut events, RoundPhase::Crashed).await;

    // The wager was already settled as a loss when the crash landed.
    assert!(matches!(
        engine.cash_out().await,
        Err(GameError::AlreadyCashedOut)
    ));
    assert!(matches!(
        engine.place_bet(10, None).await,
        Err(GameError::InvalidBet(InvalidBetReason::BettingClosed))
    ));
    assert_eq!(engine.balance().await.unwrap(), 9_900);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rounds_cycle_and_history_stays_newest_first() {
    let engine = CrashEngine::spawn(pinned_config(1.5)).unwrap();
    let mut events = engine.subscribe();

    for _ in 0..3 {
        wait_for_phase(&mut events, RoundPhase::Betting).await;
        engine.place_bet(10, None).await.unwrap();
        wait_for_phase(&mut events, RoundPhase::Crashed).await;
    }

    let history = engine.round_history().await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|r| r.crash_point == mult(150)));
    // Newest first: the most recent round leads the list.
    assert!(history[0].ended_at >= history[2].ended_at);

    engine.shutdown().await;
}
