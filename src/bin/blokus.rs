// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! A thin CLI front-end for [`blokus_engine`] (spec §6): `--spectate`
//! auto-creates a 4-AI game with mixed difficulties and drives it to
//! completion, printing the final board and scores.

use blokus_engine::{seed_from_env, Engine, EventKind, GameConfig, Move};
use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};

#[derive(Debug, Parser)]
#[command(about = "Blokus engine CLI host")]
struct Options {
    /// Auto-create a 4-AI game with mixed difficulties and play it to
    /// completion.
    #[arg(long, default_value_t = false)]
    spectate: bool,

    /// Seed for the Easy strategy's tie-breaking RNG. Overrides
    /// `BLOKUS_SEED` when given.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    let _logger = Logger::try_with_env_or_str(options.log_level.as_str())?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(match cfg!(debug_assertions) {
            true => AdaptiveFormat::WithThread,
            false => AdaptiveFormat::Default,
        })
        .start()?;

    if !options.spectate {
        println!("nothing to do: pass --spectate to watch a 4-AI game play out");
        return Ok(());
    }

    let seed = options.seed.or_else(seed_from_env);
    let mut engine = Engine::new_game(GameConfig::spectate(seed))?;
    engine.start()?;

    loop {
        let snapshot = engine.snapshot();
        if snapshot.phase == blokus_engine::Phase::Ended {
            break;
        }
        let mv = engine.request_ai_move(None)?;
        match mv {
            Move::Pass { player } => log::info!("{player:?} passes"),
            Move::Place { player, piece, anchor, .. } => {
                log::info!("{player:?} places {piece} at {anchor}")
            }
        }
    }

    let snapshot = engine.snapshot();
    print_board(&snapshot.board);
    for view in &snapshot.players {
        println!("{}: {} points", view.name, view.score.final_score);
    }
    for event in engine.events() {
        if let EventKind::GameEnded { winners, .. } = &event.kind {
            println!("winners: {winners:?}");
        }
    }

    Ok(())
}

fn print_board(board: &[Vec<u8>]) {
    for row in board {
        let line: String = row
            .iter()
            .map(|&cell| if cell == 0 { '.' } else { (b'A' + cell - 1) as char })
            .collect();
        println!("{line}");
    }
}
