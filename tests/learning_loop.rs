//! Full sessions driven by the perceptron pilot.

use dino::{AgentRole, Control, Controller, Game, GameConfig, Perceptron, SpriteSizes};

fn setup(seed: u64) -> (Game, Controller<Perceptron>) {
    let config = GameConfig {
        seed: Some(seed),
        learning_rate: 0.0001,
        ..GameConfig::default()
    };
    let game = Game::new(config.clone(), &SpriteSizes::classic(config.scale)).unwrap();
    let mut pilot = Controller::new(
        [(Control::Play, AgentRole::Restart), (Control::Jump, AgentRole::Jump)],
        Perceptron::new(config.learning_rate),
    );
    assert!(pilot.set(Control::Play, true));
    (game, pilot)
}

#[test]
fn every_death_restarts_exactly_once() {
    let (mut game, mut pilot) = setup(17);
    let mut sessions = 0;
    let mut was_playing = false;

    for _ in 0..200_000 {
        game.tick(&mut pilot);
        let playing = game.state().playing;
        if playing && !was_playing {
            sessions += 1;
        }
        was_playing = playing;
        if pilot.source().deaths() >= 10 {
            break;
        }
    }

    let deaths = pilot.source().deaths();
    assert_eq!(deaths, 10);
    // the session that just ended restarts on the next tick
    assert_eq!(sessions, deaths);
    game.tick(&mut pilot);
    assert!(game.state().playing);
}

#[test]
fn invariants_hold_every_tick() {
    let (mut game, mut pilot) = setup(3);
    let max = game.kinematics().max_speed;
    let mut last_speed = 0.0f32;

    for _ in 0..50_000 {
        let was_playing = game.state().playing;
        game.tick(&mut pilot);
        let state = game.state();

        assert!(state.runner.rect.bottom <= state.ground_level + 1e-3);
        assert!(state.game_speed <= max);
        if was_playing && state.playing {
            assert!(state.game_speed >= last_speed);
        }
        last_speed = state.game_speed;

        let mut seen = 0u64;
        for &i in state.obstacles.active_indices() {
            assert_eq!(seen & (1 << i), 0);
            seen |= 1 << i;
        }
    }
}

#[test]
fn weights_only_change_on_death() {
    let (mut game, mut pilot) = setup(29);
    let mut weights = *pilot.source().weights();
    let mut deaths = 0;

    for _ in 0..100_000 {
        game.tick(&mut pilot);
        let agent = pilot.source();
        if agent.deaths() == deaths {
            assert_eq!(agent.weights(), &weights);
        } else {
            assert_eq!(agent.deaths(), deaths + 1);
            deaths = agent.deaths();
            weights = *agent.weights();
        }
        if deaths >= 20 {
            break;
        }
    }
    assert!(deaths > 0);
    assert_ne!(pilot.source().weights(), &[0.0; 6]);
}

#[test]
fn paused_learning_keeps_weights() {
    let (mut game, mut pilot) = setup(8);
    game.state_mut().paused_for_learning = true;
    let mut sessions_ended = 0;
    let mut was_playing = false;

    for _ in 0..100_000 {
        game.tick(&mut pilot);
        let playing = game.state().playing;
        if was_playing && !playing {
            sessions_ended += 1;
        }
        was_playing = playing;
        if sessions_ended >= 5 {
            break;
        }
    }

    assert_eq!(sessions_ended, 5);
    assert_eq!(pilot.source().deaths(), 0);
    assert_eq!(pilot.source().weights(), &[0.0; 6]);
}
