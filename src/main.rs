//! Ink Street: a painting-mastery board game on a 36-cell loop, using Bevy.
//! Roll to move the brush token, master skills by paying coins and showing
//! a photo of your practice, and watch the central painting fill in as the
//! Brush, Ink, Paper and Color modules complete.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future};
use clap::Parser;
use ink_street::advisor::{CritiqueRequest, GeminiAdvisor, critique_or_fallback};
use ink_street::{
    AdvisorConfig, CellKind, Evidence, GameConfig, GameError, GameSession, Module, PurchaseError,
    TurnEvent,
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const TILE_SIZE: f32 = 56.0;
const BOARD_COLOR: Color = Color::rgb(0.65, 0.86, 0.97);
const SPECIAL_COLOR: Color = Color::rgb(0.33, 0.68, 0.94);
const CHANCE_COLOR: Color = Color::rgb(0.99, 0.73, 0.45);
const CHEST_COLOR: Color = Color::rgb(0.58, 0.77, 0.99);
const TAX_COLOR: Color = Color::rgb(0.85, 0.85, 0.85);

#[derive(Parser, Debug)]
#[command(name = "ink-street", about = "Painting mastery board game")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fixed dice seed
    #[arg(long)]
    seed: Option<u64>,
    /// Photo of your practice, attached to every purchase
    #[arg(long)]
    evidence: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => match GameConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, "could not load config");
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let advisor = config.advisor.clone().with_env_key();
    info!(seed = ?config.seed, advisor = advisor.api_key.is_some(), "starting");

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Ink Street".to_string(),
                        resolution: (1280.0, 720.0).into(),
                        resizable: true,
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .disable::<LogPlugin>(),
        )
        .insert_resource(ClearColor(BOARD_COLOR))
        .insert_resource(Game(GameSession::new(config)))
        .insert_resource(AdvisorSettings(advisor))
        .insert_resource(EvidenceSource(args.evidence))
        .insert_resource(UiState::default())
        .insert_resource(CritiqueTask::default())
        .add_systems(Startup, (setup_camera, setup_board, setup_ui))
        .add_systems(
            Update,
            (
                handle_input,
                drive_turn,
                poll_critique,
                move_token,
                update_painting,
                update_ui,
            )
                .chain(),
        )
        .run();
}

#[derive(Resource)]
struct Game(GameSession);

#[derive(Resource)]
struct AdvisorSettings(AdvisorConfig);

#[derive(Resource)]
struct EvidenceSource(Option<PathBuf>);

#[derive(Resource, Default)]
struct UiState {
    message: String,
    critique: Option<String>,
    confirm_reset: bool,
}

#[derive(Resource, Default)]
struct CritiqueTask(Option<Task<String>>);

#[derive(Component)]
struct PlayerToken;

#[derive(Component)]
struct InfoText;

#[derive(Component, Clone, Copy)]
enum PaintingLayer {
    Sketch,
    InkWash,
    Pigment,
    Paper,
}

fn module_color(module: Module) -> Color {
    match module {
        Module::Brush => Color::rgb(0.43, 0.91, 0.72),
        Module::Ink => Color::rgb(0.58, 0.77, 0.99),
        Module::Paper => Color::rgb(0.99, 0.73, 0.45),
        Module::Color => Color::rgb(0.98, 0.66, 0.83),
        Module::Misc => SPECIAL_COLOR,
    }
}

fn cell_position(grid_index: usize, game: &GameSession) -> Vec2 {
    let (col, row) = game.board().cell_at(grid_index).grid_coord();
    Vec2::new(
        (col as f32 - 5.5) * TILE_SIZE,
        (5.5 - row as f32) * TILE_SIZE,
    )
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle {
        transform: Transform::from_xyz(120.0, 0.0, 999.0),
        ..Default::default()
    });
}

fn setup_board(mut commands: Commands, game: Res<Game>) {
    for cell in game.0.board().cells() {
        let color = match cell.kind {
            CellKind::Purchasable => module_color(cell.module),
            CellKind::Chance => CHANCE_COLOR,
            CellKind::Chest => CHEST_COLOR,
            CellKind::Tax => TAX_COLOR,
            CellKind::Start | CellKind::Jail | CellKind::Rest | CellKind::GoToJail => SPECIAL_COLOR,
        };
        let label = if cell.price > 0 {
            format!("{}\n{}", cell.name, cell.price)
        } else {
            cell.name.to_string()
        };

        commands
            .spawn(SpriteBundle {
                sprite: Sprite {
                    color,
                    custom_size: Some(Vec2::splat(TILE_SIZE - 2.0)),
                    ..Default::default()
                },
                transform: Transform::from_translation(
                    cell_position(cell.grid_index, &game.0).extend(0.0),
                ),
                ..Default::default()
            })
            .with_children(|parent| {
                parent.spawn(Text2dBundle {
                    text: Text::from_section(
                        label,
                        TextStyle {
                            font_size: 9.0,
                            color: Color::rgb(0.12, 0.23, 0.54),
                            ..Default::default()
                        },
                    ),
                    transform: Transform::from_xyz(0.0, 0.0, 1.0),
                    ..Default::default()
                });
            });
    }

    let layers = [
        (PaintingLayer::Paper, Color::rgb(0.99, 0.95, 0.88), 1.0),
        (PaintingLayer::Sketch, Color::rgb(0.55, 0.55, 0.6), 2.0),
        (PaintingLayer::InkWash, Color::rgb(0.2, 0.35, 0.6), 3.0),
        (PaintingLayer::Pigment, Color::rgb(0.85, 0.4, 0.55), 4.0),
    ];
    for (layer, color, z) in layers {
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: color.with_a(0.0),
                    custom_size: Some(Vec2::splat(TILE_SIZE * 7.0)),
                    ..Default::default()
                },
                transform: Transform::from_xyz(0.0, 0.0, z),
                ..Default::default()
            },
            layer,
        ));
    }

    let start = cell_position(game.0.player().position, &game.0);
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                color: Color::rgb(0.9, 0.2, 0.3),
                custom_size: Some(Vec2::splat(20.0)),
                ..Default::default()
            },
            transform: Transform::from_translation(start.extend(10.0)),
            ..Default::default()
        },
        PlayerToken,
    ));
}

fn setup_ui(mut commands: Commands, asset_server: Res<AssetServer>) {
    let font = asset_server.load("fonts/FiraSans-Bold.ttf");
    commands
        .spawn(NodeBundle {
            style: Style {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                padding: UiRect::all(Val::Px(12.0)),
                ..Default::default()
            },
            background_color: BackgroundColor(Color::NONE),
            ..Default::default()
        })
        .with_children(|parent| {
            parent
                .spawn(NodeBundle {
                    style: Style {
                        width: Val::Percent(28.0),
                        height: Val::Percent(100.0),
                        flex_direction: FlexDirection::Column,
                        padding: UiRect::all(Val::Px(8.0)),
                        ..Default::default()
                    },
                    background_color: BackgroundColor(Color::rgb(0.12, 0.23, 0.54).with_a(0.8)),
                    ..Default::default()
                })
                .with_children(|sidebar| {
                    sidebar.spawn((
                        TextBundle {
                            text: Text::from_section(
                                "",
                                TextStyle {
                                    font: font.clone(),
                                    font_size: 16.0,
                                    color: Color::WHITE,
                                },
                            ),
                            ..Default::default()
                        },
                        InfoText,
                    ));
                });
        });
}

fn load_evidence(source: &EvidenceSource) -> Evidence {
    let Some(path) = &source.0 else {
        return Evidence::default();
    };
    match std::fs::read(path) {
        Ok(bytes) => {
            let mime = match path.extension().and_then(|ext| ext.to_str()) {
                Some("png") => "image/png",
                Some("webp") => "image/webp",
                _ => "image/jpeg",
            };
            Evidence::new(bytes).with_mime(mime)
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read evidence");
            Evidence::default()
        }
    }
}

fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut game: ResMut<Game>,
    mut ui: ResMut<UiState>,
    mut critique: ResMut<CritiqueTask>,
    evidence_source: Res<EvidenceSource>,
    advisor: Res<AdvisorSettings>,
) {
    let game = &mut game.0;

    if keyboard.just_pressed(KeyCode::KeyR) {
        if ui.confirm_reset {
            game.reset();
            ui.confirm_reset = false;
            ui.critique = None;
            ui.message = "Progress reset".to_string();
        } else {
            ui.confirm_reset = true;
            ui.message = "Press R again to reset all progress".to_string();
        }
        return;
    }
    if keyboard.get_just_pressed().next().is_some() {
        ui.confirm_reset = false;
    }

    if keyboard.just_pressed(KeyCode::Space) {
        match game.roll() {
            Ok(outcome) => {
                ui.critique = None;
                ui.message = format!("Rolled {outcome}");
            }
            Err(GameError::Busy) => {}
            Err(err) => ui.message = err.to_string(),
        }
    }

    if keyboard.just_pressed(KeyCode::KeyV) && !game.is_busy() {
        let cell = game.board().cell_at(game.player().position);
        if cell.kind == CellKind::Purchasable {
            game.acknowledge();
            if let Ok(effect) = game.view(cell.id) {
                ui.message = effect.message(game.board());
            }
        }
    }

    if keyboard.just_pressed(KeyCode::KeyB) {
        if let Some(id) = game.viewed_cell() {
            ui.message = match game.purchase(id, load_evidence(&evidence_source)) {
                Ok(record) => format!("Skill mastered! -{} coins", record.price),
                Err(GameError::Purchase(PurchaseError::AlreadyOwned(_))) => {
                    game.acknowledge();
                    String::new()
                }
                Err(GameError::Purchase(PurchaseError::MissingEvidence)) => {
                    "Attach a photo with --evidence to master a skill".to_string()
                }
                Err(err) => err.to_string(),
            };
        }
    }

    if keyboard.just_pressed(KeyCode::Escape) {
        game.acknowledge();
    }

    if keyboard.just_pressed(KeyCode::KeyC) && critique.0.is_none() {
        if let Some(cell) = game.viewed_cell().and_then(|id| game.board().cell(id)) {
            let mut request = CritiqueRequest::for_cell(cell);
            if let Some(evidence) = game.ledger().evidence(cell.id) {
                request = request.with_evidence(evidence.clone());
            } else {
                request = request.with_evidence(load_evidence(&evidence_source));
            }
            ui.critique = Some("The tutor is looking...".to_string());
            critique.0 = Some(spawn_critique(advisor.0.clone(), request));
        }
    }
}

/// Runs the blocking advisor call on the async compute pool so the frame
/// loop keeps drawing while the tutor answers.
fn spawn_critique(config: AdvisorConfig, request: CritiqueRequest) -> Task<String> {
    AsyncComputeTaskPool::get().spawn(async move {
        let fallback = config.fallback_text.clone();
        match GeminiAdvisor::new(config) {
            Ok(client) => critique_or_fallback(&client, &request, &fallback),
            Err(err) => {
                warn!(%err, "advisor client unavailable");
                fallback
            }
        }
    })
}

fn drive_turn(time: Res<Time>, mut game: ResMut<Game>, mut ui: ResMut<UiState>) {
    let game = &mut game.0;
    match game.tick(time.delta()) {
        Some(TurnEvent::Moved(report)) if report.passed_start => {
            ui.message = format!("Passed Start: +{} coins", report.salary);
        }
        Some(TurnEvent::Landed(effect)) => {
            let message = effect.message(game.board());
            if !message.is_empty() {
                ui.message = message;
            }
        }
        _ => {}
    }
}

fn poll_critique(mut task: ResMut<CritiqueTask>, mut ui: ResMut<UiState>) {
    let Some(pending) = task.0.as_mut() else {
        return;
    };
    if let Some(text) = block_on(future::poll_once(pending)) {
        ui.critique = Some(text);
        task.0 = None;
    }
}

fn move_token(game: Res<Game>, mut tokens: Query<&mut Transform, With<PlayerToken>>) {
    let target = cell_position(game.0.player().position, &game.0);
    for mut transform in tokens.iter_mut() {
        transform.translation = target.extend(10.0);
    }
}

fn update_painting(game: Res<Game>, mut layers: Query<(&mut Sprite, &PaintingLayer)>) {
    let painting = game.0.snapshot().painting;
    for (mut sprite, layer) in layers.iter_mut() {
        let alpha = match layer {
            PaintingLayer::Sketch => painting.sketch,
            PaintingLayer::InkWash => painting.ink_wash * 0.6,
            PaintingLayer::Pigment => painting.pigment * 0.5,
            PaintingLayer::Paper => painting.paper_fill,
        };
        sprite.color.set_a(alpha);
    }
}

fn update_ui(mut info_text: Query<&mut Text, With<InfoText>>, game: Res<Game>, ui: Res<UiState>) {
    let Ok(mut text) = info_text.get_single_mut() else {
        return;
    };
    let game = &game.0;
    let snapshot = game.snapshot();
    let player = &snapshot.player;

    let mut content = String::new();
    content.push_str("Ink Street\n");
    content.push_str("Space roll | V view | B master | C tutor | Esc close | R R reset\n\n");
    content.push_str(&format!(
        "Coins: {}\nPosition: {} ({})\n",
        player.funds,
        player.position,
        game.board().cell_at(player.position).name
    ));
    if let Some(roll) = player.pending_roll {
        content.push_str(&format!("Last roll: {roll}\n"));
    }
    if player.in_rest {
        content.push_str("Facing the wall in quiet reflection\n");
    }
    content.push('\n');
    for module in Module::MASTERY {
        let ratio = snapshot.progress.module(module);
        let mark = if snapshot.progress.is_complete(module) { " *" } else { "" };
        content.push_str(&format!("{module}: {:.0}%{mark}\n", ratio * 100.0));
    }
    content.push_str(&format!("Painting: {}%\n\n", snapshot.painting.percent));

    if let Some(cell) = game.viewed_cell().and_then(|id| game.board().cell(id)) {
        let owned = game.ledger().is_owned(cell.id);
        content.push_str(&format!(
            "[{} / {}]\n{}\n{}\nPrice {} | Consult fee {}\n{}\n\n",
            cell.module,
            cell.name,
            cell.description,
            cell.action,
            cell.price,
            cell.consult_fee,
            if owned { "Mastered" } else { "Press B to master" }
        ));
    }
    if !ui.message.is_empty() {
        content.push_str(&format!("{}\n", ui.message));
    }
    if let Some(critique) = &ui.critique {
        content.push_str(&format!("\nTutor: {critique}\n"));
    }
    text.sections[0].value = content;
}
