//! Headless driving demo: runs the fixed-tick loop with scripted input and
//! reports the vehicle's progress.
//!
//! ```sh
//! RUST_LOG=info cargo run --example drive
//! ```

use slush::prelude::*;

fn main() {
    env_logger::init();

    let config = GameConfig::load("slush.json");
    let dt = config.tick_dt();
    let ticks = (config.tick_rate * 10.0) as u32;

    let mut game = Game::new(config);
    game.setup();
    game.join_io();

    // Tap the engine-start key, then hold accelerate with a gentle left turn.
    let start = Binding::key('E' as i32);
    game.input().process_event(start, true);
    game.tick(dt);
    game.input().process_event(start, false);
    game.input().process_event(Binding::key('W' as i32), true);
    game.input().process_event(Binding::key('A' as i32), true);

    for tick in 0..ticks {
        game.tick(dt);

        if tick % 60 == 0 {
            if let Some(car) = game.car() {
                let pos = car.matrix().w_axis;
                log::info!(
                    "t={:5.2}s speed={:5.1} steering={:5.2} pos=({:6.2}, {:6.2}, {:5.2})",
                    tick as f32 * dt,
                    car.controller().speed(),
                    car.controller().steering(),
                    pos.x,
                    pos.y,
                    pos.z
                );
            }
        }
    }

    let painted = game
        .canvas()
        .pixels()
        .chunks(game.canvas().components().max(1))
        .filter(|px| px.get(1) == Some(&255))
        .count();
    log::info!("Track pixels painted: {painted}");

    game.teardown();
}
