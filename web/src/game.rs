use crate::geometry::BoardGeometry;
use crate::input;
use crate::utils::*;
use clap::Args;
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use infinito_core as game;
use game::{Action, Mode, Scheduled, TileFlags};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;
use yew::prelude::*;

/// Highest score ever reached, kept across page loads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct BestScore(pub game::Score);

impl StorageKey for BestScore {
    const KEY: &'static str = "2048-infinite-best";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Msg {
    Act(Action),
    Complete(Scheduled),
    TouchStart(f64, f64),
    TouchEnd(f64, f64),
    Resize,
}

fn value_class(value: game::TileValue) -> String {
    if value <= 8192 {
        format!("tile-{}", value)
    } else {
        "tile-super".to_string()
    }
}

fn digits_class(value: game::TileValue) -> String {
    let digits = value.checked_ilog10().map_or(1, |log| log + 1).min(4);
    format!("digits-{}", digits)
}

fn tile_classes(tile: &game::RenderTile) -> Classes {
    let mut class = classes!("tile", value_class(tile.value), digits_class(tile.value));
    if tile.flags.contains(TileFlags::DELETED) {
        class.push("ghost");
    } else if tile.flags.contains(TileFlags::MERGING) {
        class.push("merging");
    } else if tile.flags.contains(TileFlags::MERGED) {
        class.push("merged");
    } else if tile.flags.contains(TileFlags::NEW) {
        class.push("new");
    }
    if tile.highlighted {
        class.push("highlighted");
    }
    if tile.dimmed {
        class.push("dimmed");
    }
    class
}

fn touch_point(touches: &web_sys::TouchList) -> Option<(f64, f64)> {
    touches
        .get(0)
        .map(|touch| (f64::from(touch.client_x()), f64::from(touch.client_y())))
}

#[derive(Properties, Clone, PartialEq)]
struct TileProps {
    tile: game::RenderTile,
    geometry: BoardGeometry,
    callback: Callback<game::TileId>,
}

#[function_component(TileView)]
fn tile_component(props: &TileProps) -> Html {
    let TileProps {
        tile,
        geometry,
        callback,
    } = props.clone();

    let (x, y) = tile.pos;
    let style = format!(
        "width: {cell}px; height: {cell}px; transform: translate({left}px, {top}px); transition-duration: {ms}ms;",
        cell = geometry.cell,
        left = geometry.offset(x),
        top = geometry.offset(y),
        ms = game::SLIDE_DURATION_MS,
    );

    let onclick = Callback::from(move |e: MouseEvent| {
        e.stop_propagation();
        log::trace!("tile {} tapped at {:?}", tile.id, tile.pos);
        callback.emit(tile.id);
    });

    html! {
        <div class={tile_classes(&tile)} {style} {onclick}>{tile.value.to_string()}</div>
    }
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of cells on each side of the board
    #[arg(long, default_value_t = 4)]
    size: game::Coord,
}

pub(crate) struct GameView {
    session: game::GameSession,
    rng: SmallRng,
    saved_best: game::Score,
    geometry: BoardGeometry,
    board_ref: NodeRef,
    touch_start: Option<(f64, f64)>,
    pending: Option<Timeout>,
    _keydown: EventListener,
    _resize: EventListener,
}

impl GameView {
    fn create_keydown_listener(ctx: &Context<Self>) -> EventListener {
        let link = ctx.link().clone();
        EventListener::new(&gloo::utils::window(), "keydown", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if let Some(action) = input::key_action(&event.key()) {
                event.prevent_default();
                link.send_message(Msg::Act(action));
            }
        })
    }

    fn create_resize_listener(ctx: &Context<Self>) -> EventListener {
        let link = ctx.link().clone();
        EventListener::new(&gloo::utils::window(), "resize", move |_| {
            link.send_message(Msg::Resize)
        })
    }

    /// Arms a timer that hands `scheduled` back to the session.
    ///
    /// A replaced timer is dropped, which cancels it; the session would ignore its ticket anyway.
    fn schedule(&mut self, ctx: &Context<Self>, scheduled: Scheduled) {
        let link = ctx.link().clone();
        log::trace!("{:?} in {}ms", scheduled, scheduled.delay_ms());
        self.pending = Some(Timeout::new(scheduled.delay_ms(), move || {
            link.send_message(Msg::Complete(scheduled))
        }));
    }

    fn resize(&mut self) -> bool {
        let Some(frame) = self.board_ref.cast::<HtmlElement>() else {
            return false;
        };
        let (columns, _) = self.session.board().size();
        let geometry = BoardGeometry::from_width(f64::from(frame.client_width()), columns);
        if geometry != self.geometry {
            log::trace!("board geometry: {:?}", geometry);
            self.geometry = geometry;
            true
        } else {
            false
        }
    }

    fn save_best_score(&mut self) {
        let best = self.session.best_score();
        if best > self.saved_best {
            self.saved_best = best;
            BestScore(best).local_save();
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let seed = props.seed.unwrap_or_else(js_random_seed);
        log::debug!("seed: {}", seed);

        let mut rng = SmallRng::seed_from_u64(seed);
        let BestScore(saved_best) = LocalOrDefault::local_or_default();
        let config = game::GameConfig::square(props.size);
        let session = game::GameSession::new(config, saved_best, &mut rng);

        Self {
            session,
            rng,
            saved_best,
            geometry: BoardGeometry::default(),
            board_ref: NodeRef::default(),
            touch_start: None,
            pending: None,
            _keydown: GameView::create_keydown_listener(ctx),
            _resize: GameView::create_resize_listener(ctx),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        let outcome = match msg {
            Act(action) => {
                log::debug!("action: {:?}", action);
                self.session.apply(action, &mut self.rng)
            }
            Complete(scheduled) => self.session.complete(scheduled, &mut self.rng),
            TouchStart(x, y) => {
                self.touch_start = Some((x, y));
                return false;
            }
            TouchEnd(x, y) => {
                let swipe = self
                    .touch_start
                    .take()
                    .and_then(|start| input::swipe_direction(start, (x, y)));
                match swipe {
                    Some(direction) => self.session.apply(Action::Move(direction), &mut self.rng),
                    None => return false,
                }
            }
            Resize => return self.resize(),
        };

        if let Some(scheduled) = outcome.scheduled() {
            self.schedule(ctx, scheduled);
        }
        self.save_best_score();
        outcome.has_update()
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            ctx.link().send_message(Msg::Resize);
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use Msg::*;

        let frame = self.session.frame();
        let geometry = self.geometry;
        let (cols, rows) = frame.size;
        let locked = frame.game_over || frame.transitioning;

        let cb_reset = ctx.link().callback(|_: MouseEvent| Act(Action::Reset));
        let cb_undo = ctx.link().callback(|_: MouseEvent| Act(Action::Undo));
        let cb_swap = ctx.link().callback(|_: MouseEvent| Act(Action::ToggleSwap));
        let cb_clear = ctx.link().callback(|_: MouseEvent| Act(Action::ToggleClear));
        let cb_keep_going = ctx.link().callback(|_: MouseEvent| Act(Action::AcknowledgeWin));
        let cb_tap = ctx.link().callback(|id| Act(Action::TapTile(id)));
        let ontouchstart = ctx.link().batch_callback(|e: TouchEvent| {
            touch_point(&e.touches()).map(|(x, y)| TouchStart(x, y))
        });
        let ontouchend = ctx.link().batch_callback(|e: TouchEvent| {
            touch_point(&e.changed_touches()).map(|(x, y)| TouchEnd(x, y))
        });

        let board_style = format!(
            "width: {}px; height: {}px;",
            geometry.extent(cols),
            geometry.extent(rows)
        );
        let cell_style = |x, y| {
            format!(
                "width: {cell}px; height: {cell}px; left: {left}px; top: {top}px;",
                cell = geometry.cell,
                left = geometry.offset(x),
                top = geometry.offset(y),
            )
        };

        let hint = match frame.mode {
            Mode::Normal => None,
            Mode::Swap if frame.selected.is_some() => Some("Tap another tile to swap"),
            Mode::Swap => Some("Tap a tile to pick it up"),
            Mode::Clear => Some("Tap a tile to clear every tile with its value"),
        };

        html! {
            <div class="infinito">
                <header>
                    <h1>{"2048 "}<span>{"∞"}</span></h1>
                    <aside class="score">{frame.score.to_string()}</aside>
                    <aside class="best">{frame.best_score.to_string()}</aside>
                </header>
                <nav>
                    <button onclick={cb_reset.clone()}>{"Reset"}</button>
                    <button onclick={cb_undo.clone()} disabled={!frame.can_undo}>{"Undo"}</button>
                </nav>
                <div class="board-frame" ref={self.board_ref.clone()}>
                    <div class={classes!("board", locked.then_some("locked"))} style={board_style} {ontouchstart} {ontouchend}>
                        {
                            for (0..rows).flat_map(|y| (0..cols).map(move |x| (x, y))).map(|(x, y)| html! {
                                <div class="cell" style={cell_style(x, y)}/>
                            })
                        }
                        {
                            for frame.tiles.iter().map(|&tile| html! {
                                <TileView key={tile.id} {tile} {geometry} callback={cb_tap.clone()}/>
                            })
                        }
                        if frame.game_over {
                            <div class="overlay game-over">
                                <h2>{"Game Over!"}</h2>
                                <p>{format!("Final Score: {}", frame.score)}</p>
                                <button onclick={cb_undo} disabled={!frame.can_undo}>{"Undo"}</button>
                                <button onclick={cb_reset}>{"Try Again"}</button>
                            </div>
                        } else if frame.show_win_banner() {
                            <div class="overlay win">
                                <h2>{format!("{}!", self.session.config().win_value)}</h2>
                                <button onclick={cb_keep_going}>{"Keep Going"}</button>
                            </div>
                        }
                    </div>
                </div>
                <footer>
                    <button class={classes!((frame.mode == Mode::Swap).then_some("active"))} onclick={cb_swap} disabled={locked}>
                        {if frame.mode == Mode::Swap { "Cancel Swap" } else { "Swap Tile" }}
                    </button>
                    <button class={classes!((frame.mode == Mode::Clear).then_some("active"))} onclick={cb_clear} disabled={locked}>
                        {if frame.mode == Mode::Clear { "Cancel Clear" } else { "Clear Value" }}
                    </button>
                </footer>
                if let Some(hint) = hint {
                    <p class="hint">{hint}</p>
                }
            </div>
        }
    }
}
