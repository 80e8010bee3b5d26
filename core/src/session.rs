use alloc::vec::Vec;
use core::mem;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// How long the presentation layer animates tiles sliding.
pub const SLIDE_DURATION_MS: u32 = 200;

/// Delay before a move settles: the slide plus a short buffer.
pub const SETTLE_DELAY_MS: u32 = SLIDE_DURATION_MS + 20;

/// Delay before a tile reappears on a board emptied by a clear.
pub const RESPAWN_DELAY_MS: u32 = 150;

/// Identifies one scheduled settle or respawn; a session only honours the ticket it issued last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettleTicket(u64);

impl SettleTicket {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Normal,
    /// Tap two tiles to exchange their cells.
    Swap,
    /// Tap a tile to remove every tile of its value.
    Clear,
}

/// Player intents accepted by [`GameSession::apply`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(Direction),
    Cancel,
    TapTile(TileId),
    Reset,
    Undo,
    ToggleSwap,
    ToggleClear,
    AcknowledgeWin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Phase {
    Idle,
    Transitioning {
        ticket: SettleTicket,
        slide: SlideState,
        settled: Board,
        score_delta: Score,
    },
}

/// A tile positioned for drawing, along with its selection hints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTile {
    pub id: TileId,
    pub value: TileValue,
    pub pos: Coord2,
    pub flags: TileFlags,
    pub highlighted: bool,
    pub dimmed: bool,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub size: Coord2,
    pub tiles: Vec<RenderTile>,
    pub score: Score,
    pub best_score: Score,
    pub mode: Mode,
    pub selected: Option<TileId>,
    pub won: bool,
    pub win_acknowledged: bool,
    pub game_over: bool,
    pub transitioning: bool,
    pub can_undo: bool,
}

impl RenderFrame {
    pub fn show_win_banner(&self) -> bool {
        self.won && !self.win_acknowledged
    }
}

/// One game in progress: board, score, modes, undo history and the pending half of a move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    config: GameConfig,
    spawner: TileSpawner,
    board: Board,
    phase: Phase,
    history: History,
    score: Score,
    best_score: Score,
    mode: Mode,
    selected: Option<TileId>,
    won: bool,
    win_acknowledged: bool,
    game_over: bool,
    ids: TileIds,
    next_ticket: u64,
    pending_respawn: Option<SettleTicket>,
}

impl GameSession {
    /// Starts a new game, keeping `best_score` from earlier sessions.
    pub fn new<R: Rng + ?Sized>(config: GameConfig, best_score: Score, rng: &mut R) -> Self {
        let mut session = Self::with_board(config, Board::new(config.size), 0);
        session.best_score = best_score;
        session.reset(rng);
        session
    }

    /// Resumes play on an existing settled board.
    pub fn with_board(config: GameConfig, board: Board, score: Score) -> Self {
        let config = GameConfig {
            size: board.size(),
            ..config
        };
        let last_id = board.tiles().map(|(_, tile)| tile.id).max().unwrap_or(0);
        let game_over = board.is_game_over();

        Self {
            config,
            spawner: config.spawner(),
            board,
            phase: Phase::Idle,
            history: History::new(config.history_limit),
            score,
            best_score: score,
            mode: Mode::Normal,
            selected: None,
            won: false,
            win_acknowledged: false,
            game_over,
            ids: TileIds::after(last_id),
            next_ticket: 0,
            pending_respawn: None,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Last settled board; while a move is animating this is still the board before the move.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn slide(&self) -> Option<&SlideState> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Transitioning { slide, .. } => Some(slide),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn best_score(&self) -> Score {
        self.best_score
    }

    /// Raises the best score to a value loaded from storage.
    pub fn restore_best_score(&mut self, best_score: Score) {
        self.best_score = self.best_score.max(best_score);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected(&self) -> Option<TileId> {
        self.selected
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_win_acknowledged(&self) -> bool {
        self.win_acknowledged
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning { .. })
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty() && !self.is_transitioning()
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, action: Action, rng: &mut R) -> ActionOutcome {
        use Action::*;
        match action {
            Move(direction) => self.apply_move(direction),
            Cancel => self.cancel(),
            TapTile(id) => self.tap_tile(id),
            Reset => self.reset(rng),
            Undo => self.undo(),
            ToggleSwap => self.toggle_swap(),
            ToggleClear => self.toggle_clear(),
            AcknowledgeWin => self.acknowledge_win(),
        }
    }

    /// Runs a previously scheduled step once its delay has passed.
    pub fn complete<R: Rng + ?Sized>(&mut self, scheduled: Scheduled, rng: &mut R) -> ActionOutcome {
        match scheduled {
            Scheduled::Settle(ticket) => self.settle(ticket, rng),
            Scheduled::Respawn(ticket) => self.respawn(ticket, rng),
        }
    }

    /// Throws away the current game and deals a fresh board.
    ///
    /// Any settle or respawn still scheduled for the old game is invalidated.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ActionOutcome {
        if self.is_transitioning() {
            log::debug!("reset while a move is settling, pending settle dropped");
        }
        self.board = self
            .spawner
            .initial_board(self.config.size, &mut self.ids, rng);
        self.phase = Phase::Idle;
        self.history.clear();
        self.score = 0;
        self.mode = Mode::Normal;
        self.selected = None;
        self.won = false;
        self.win_acknowledged = false;
        self.game_over = false;
        self.pending_respawn = None;
        log::debug!("new game on {:?} board", self.config.size);
        ActionOutcome::Changed
    }

    /// Starts a move: records history and exposes the slide, leaving the rest to [`Self::settle`].
    pub fn apply_move(&mut self, direction: Direction) -> ActionOutcome {
        if let Some(reason) = self.move_blocker() {
            log::debug!("move {:?} ignored: {}", direction, reason);
            return ActionOutcome::NoChange;
        }

        let result = transition(&self.board, direction);
        if !result.moved {
            log::trace!("move {:?} changes nothing", direction);
            return ActionOutcome::NoChange;
        }

        self.history
            .push(HistorySnapshot::capture(&self.board, self.score));
        let ticket = self.issue_ticket();
        self.phase = Phase::Transitioning {
            ticket,
            slide: result.slide,
            settled: result.settled,
            score_delta: result.score_delta,
        };
        log::debug!("move {:?} sliding, settle {:?}", direction, ticket);
        ActionOutcome::Scheduled(Scheduled::Settle(ticket))
    }

    /// Finishes the move identified by `ticket`: win check, score, spawn and game-over check.
    pub fn settle<R: Rng + ?Sized>(&mut self, ticket: SettleTicket, rng: &mut R) -> ActionOutcome {
        let (settled, score_delta) = match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Transitioning {
                ticket: pending,
                settled,
                score_delta,
                ..
            } if pending == ticket => (settled, score_delta),
            phase => {
                self.phase = phase;
                log::debug!("stale settle {:?} ignored", ticket);
                return ActionOutcome::NoChange;
            }
        };

        if !self.won
            && settled
                .max_value()
                .is_some_and(|value| value >= self.config.win_value)
        {
            log::debug!("reached {}", self.config.win_value);
            self.won = true;
        }

        self.add_score(score_delta);

        let mut board = settled;
        self.spawner.spawn_into(&mut board, &mut self.ids, rng);
        self.board = board;

        if self.board.is_game_over() {
            log::debug!("no moves left, final score {}", self.score);
            self.game_over = true;
        }
        ActionOutcome::Changed
    }

    /// Refills a board that a clear left empty.
    pub fn respawn<R: Rng + ?Sized>(&mut self, ticket: SettleTicket, rng: &mut R) -> ActionOutcome {
        if self.pending_respawn != Some(ticket) {
            log::debug!("stale respawn {:?} ignored", ticket);
            return ActionOutcome::NoChange;
        }
        self.pending_respawn = None;

        if !self.board.is_empty() {
            return ActionOutcome::NoChange;
        }
        self.spawner.spawn_into(&mut self.board, &mut self.ids, rng);
        ActionOutcome::Changed
    }

    /// Leaves swap or clear mode and drops the selection.
    pub fn cancel(&mut self) -> ActionOutcome {
        if self.is_transitioning() {
            return ActionOutcome::NoChange;
        }
        if self.mode == Mode::Normal && self.selected.is_none() {
            return ActionOutcome::NoChange;
        }
        self.mode = Mode::Normal;
        self.selected = None;
        ActionOutcome::Changed
    }

    pub fn toggle_swap(&mut self) -> ActionOutcome {
        self.toggle_mode(Mode::Swap)
    }

    pub fn toggle_clear(&mut self) -> ActionOutcome {
        self.toggle_mode(Mode::Clear)
    }

    fn toggle_mode(&mut self, mode: Mode) -> ActionOutcome {
        if self.is_transitioning() || self.game_over {
            log::debug!("toggle {:?} ignored", mode);
            return ActionOutcome::NoChange;
        }
        self.mode = if self.mode == mode { Mode::Normal } else { mode };
        self.selected = None;
        log::debug!("mode {:?}", self.mode);
        ActionOutcome::Changed
    }

    /// Handles a tap on a tile according to the current mode.
    pub fn tap_tile(&mut self, id: TileId) -> ActionOutcome {
        if self.is_transitioning() || self.game_over {
            return ActionOutcome::NoChange;
        }
        let Some(coords) = self.board.position_of(id) else {
            log::debug!("tap on unknown tile {}", id);
            return ActionOutcome::NoChange;
        };

        match self.mode {
            Mode::Normal => ActionOutcome::NoChange,
            Mode::Clear => self.clear_value_at(coords),
            Mode::Swap => match self.selected {
                None => {
                    self.selected = Some(id);
                    ActionOutcome::Changed
                }
                Some(selected) if selected == id => {
                    self.selected = None;
                    ActionOutcome::Changed
                }
                Some(selected) => match self.board.position_of(selected) {
                    Some(other) => self.swap_cells(other, coords),
                    None => {
                        self.selected = Some(id);
                        ActionOutcome::Changed
                    }
                },
            },
        }
    }

    fn swap_cells(&mut self, a: Coord2, b: Coord2) -> ActionOutcome {
        let snapshot = HistorySnapshot::capture(&self.board, self.score);
        if let Err(err) = self.board.swap(a, b) {
            log::warn!("swap {:?} <-> {:?} failed: {}", a, b, err);
            return ActionOutcome::NoChange;
        }
        self.history.push(snapshot);
        self.selected = None;
        self.mode = Mode::Normal;
        log::debug!("swapped {:?} and {:?}", a, b);
        ActionOutcome::Changed
    }

    fn clear_value_at(&mut self, coords: Coord2) -> ActionOutcome {
        let Some(tile) = self.board.get(coords) else {
            return ActionOutcome::NoChange;
        };

        self.history
            .push(HistorySnapshot::capture(&self.board, self.score));
        let removed = self.board.remove_value(tile.value);
        self.mode = Mode::Normal;
        self.selected = None;
        log::debug!("cleared {} tiles of value {}", removed, tile.value);

        if self.board.is_empty() {
            let ticket = self.issue_ticket();
            self.pending_respawn = Some(ticket);
            ActionOutcome::Scheduled(Scheduled::Respawn(ticket))
        } else {
            ActionOutcome::Changed
        }
    }

    /// Restores the most recent snapshot; mode and selection stay as they are.
    pub fn undo(&mut self) -> ActionOutcome {
        if self.is_transitioning() {
            return ActionOutcome::NoChange;
        }
        let Some(snapshot) = self.history.pop() else {
            return ActionOutcome::NoChange;
        };

        self.board = snapshot.board;
        self.score = snapshot.score;
        self.game_over = false;
        self.pending_respawn = None;
        log::debug!("undo, {} steps left", self.history.len());
        ActionOutcome::Changed
    }

    pub fn acknowledge_win(&mut self) -> ActionOutcome {
        if !self.won || self.win_acknowledged {
            return ActionOutcome::NoChange;
        }
        self.win_acknowledged = true;
        ActionOutcome::Changed
    }

    pub fn frame(&self) -> RenderFrame {
        let tiles = match &self.phase {
            Phase::Transitioning { slide, .. } => slide
                .tiles()
                .iter()
                .map(|sliding| self.render_tile(sliding.tile, sliding.to))
                .collect(),
            Phase::Idle => self
                .board
                .tiles()
                .map(|(pos, tile)| self.render_tile(tile, pos))
                .collect(),
        };

        RenderFrame {
            size: self.board.size(),
            tiles,
            score: self.score,
            best_score: self.best_score,
            mode: self.mode,
            selected: self.selected,
            won: self.won,
            win_acknowledged: self.win_acknowledged,
            game_over: self.game_over,
            transitioning: self.is_transitioning(),
            can_undo: self.can_undo(),
        }
    }

    fn render_tile(&self, tile: Tile, pos: Coord2) -> RenderTile {
        let highlighted = self.selected == Some(tile.id);
        let dimmed = self.mode == Mode::Swap && self.selected.is_some() && !highlighted;
        RenderTile {
            id: tile.id,
            value: tile.value,
            pos,
            flags: tile.flags,
            highlighted,
            dimmed,
        }
    }

    fn move_blocker(&self) -> Option<&'static str> {
        if self.is_transitioning() {
            Some("a move is still settling")
        } else if self.game_over {
            Some("game over")
        } else if self.mode != Mode::Normal {
            Some("not in normal mode")
        } else {
            None
        }
    }

    fn add_score(&mut self, delta: Score) {
        self.score = self.score.saturating_add(delta);
        if self.score > self.best_score {
            self.best_score = self.score;
        }
    }

    fn issue_ticket(&mut self) -> SettleTicket {
        self.next_ticket = self.next_ticket.wrapping_add(1);
        SettleTicket(self.next_ticket)
    }
}
