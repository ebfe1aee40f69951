//! Pokedex TUI

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pokedex::action::Action;
use pokedex::client::HttpClient;
use pokedex::components::{Component, DetailPage, DetailPageProps, ListPage, ListPageProps};
use pokedex::config::{BranchPolicy, FanoutPolicy, FetchConfig};
use pokedex::effect::Effect;
use pokedex::logging;
use pokedex::query::Queries;
use pokedex::reducer::reducer;
use pokedex::sprite_backend::{self, SpriteBackend};
use pokedex::state::{AppState, Route};
use ratatui::{layout::Rect, Frame, Terminal};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventContext, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

const LIST_TASK: &str = "pokemon_list";
const DETAIL_TASK: &str = "pokemon_details";

/// Pokemon catalog with filters, search and evolution-aware detail pages
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Browse the PokeAPI catalog in the terminal")]
struct Args {
    /// Upstream REST base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Base URL for evolution node images (`{base}/{id}.png`)
    #[arg(long)]
    image_base: Option<String>,

    /// Number of index entries to fetch
    #[arg(long)]
    limit: Option<u32>,

    /// Concurrent detail fetches during list enrichment
    #[arg(long)]
    concurrency: Option<usize>,

    /// Fail the whole list when any entry fails to load
    #[arg(long)]
    fail_fast: bool,

    /// Follow every evolution branch instead of only the first
    #[arg(long)]
    all_branches: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// RON file with fetch settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start on the detail page for this id
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    open: Option<u32>,

    /// Write logs here (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

impl Args {
    fn fetch_config(&self) -> io::Result<FetchConfig> {
        let mut config = match &self.config {
            Some(path) => FetchConfig::load(path).map_err(io::Error::other)?,
            None => FetchConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(image_base) = &self.image_base {
            config.image_base = image_base.clone();
        }
        if let Some(limit) = self.limit {
            config.list_limit = limit;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if self.fail_fast {
            config.fanout = FanoutPolicy::FailFast;
        }
        if self.all_branches {
            config.branches = BranchPolicy::All;
        }
        Ok(config)
    }
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum PokedexComponentId {
    List,
    Detail,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum PokedexContext {
    List,
    Detail,
}

impl EventRoutingState<PokedexComponentId, PokedexContext> for AppState {
    fn focused(&self) -> Option<PokedexComponentId> {
        match self.route {
            Route::List => Some(PokedexComponentId::List),
            Route::Detail(_) => Some(PokedexComponentId::Detail),
        }
    }

    fn modal(&self) -> Option<PokedexComponentId> {
        None
    }

    fn binding_context(&self, id: PokedexComponentId) -> PokedexContext {
        match id {
            PokedexComponentId::List => PokedexContext::List,
            PokedexComponentId::Detail => PokedexContext::Detail,
        }
    }

    fn default_context(&self) -> PokedexContext {
        PokedexContext::List
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;
    let config = args.fetch_config()?;
    tracing::info!(
        base_url = %config.base_url,
        limit = config.list_limit,
        concurrency = config.worker_permits(),
        fanout = ?config.fanout,
        branches = ?config.branches,
        "starting"
    );

    let http = HttpClient::new(config.base_url.clone(), config.timeout())
        .map_err(io::Error::other)?;
    let queries = Arc::new(Queries::new(Arc::new(http), config));

    let open = args.open;
    let debug = DebugSession::new(args.debug);
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let state = debug
        .load_state_or_else_async(move || async move {
            let state = match open {
                Some(id) => AppState::opened_at(id),
                None => AppState::default(),
            };
            Ok::<AppState, io::Error>(state)
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = SpriteBackend::new(stdout, sprite_backend::sprite_registry());
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, queries).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

struct PokedexUi {
    list: ListPage,
    detail: DetailPage,
}

impl PokedexUi {
    fn new() -> Self {
        Self {
            list: ListPage::new(),
            detail: DetailPage::new(),
        }
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<PokedexComponentId>,
    ) {
        sprite_backend::clear_sprites();
        match state.route {
            Route::List => {
                event_ctx.component_areas.remove(&PokedexComponentId::Detail);
                event_ctx.set_component_area(PokedexComponentId::List, area);
                let props = ListPageProps {
                    state,
                    is_focused: render_ctx.is_focused(),
                };
                self.list.render(frame, area, props);
            }
            Route::Detail(_) => {
                event_ctx.component_areas.remove(&PokedexComponentId::List);
                event_ctx.set_component_area(PokedexComponentId::Detail, area);
                let props = DetailPageProps {
                    state,
                    is_focused: render_ctx.is_focused(),
                };
                self.detail.render(frame, area, props);
            }
        }
    }

    fn handle_list_event(&mut self, event: &EventKind, state: &AppState) -> HandlerResponse<Action> {
        let props = ListPageProps {
            state,
            is_focused: true,
        };
        let actions: Vec<_> = self.list.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }

    fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = DetailPageProps {
            state,
            is_focused: true,
        };
        let actions: Vec<_> = self.detail.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    queries: Arc<Queries>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(PokedexUi::new()));
    let mut bus: EventBus<AppState, Action, PokedexComponentId, PokedexContext> = EventBus::new();
    let keybindings: Keybindings<PokedexContext> = Keybindings::new();

    let ui_list = Rc::clone(&ui);
    bus.register(PokedexComponentId::List, move |event, state| {
        ui_list.borrow_mut().handle_list_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(PokedexComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            KeyCode::Char('q') if !state.search_active => HandlerResponse::action(Action::Quit),
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(120), || Action::Tick);
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, Arc::clone(&queries)),
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, queries: Arc<Queries>) {
    match effect {
        Effect::LoadList { refresh } => {
            if refresh {
                queries.invalidate_list();
            }
            ctx.tasks().spawn(TaskKey::new(LIST_TASK), async move {
                match queries.pokemon_list().await {
                    Ok(list) => Action::ListDidLoad(list),
                    Err(error) => Action::ListDidError(error.to_string()),
                }
            });
        }
        Effect::LoadDetail { id } => {
            ctx.tasks().spawn(TaskKey::new(DETAIL_TASK), async move {
                match queries.pokemon_details(id).await {
                    Ok(details) => Action::DetailDidLoad(details),
                    Err(error) => Action::DetailDidError {
                        id,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::CancelDetail => {
            ctx.tasks().cancel(&TaskKey::new(DETAIL_TASK));
        }
        Effect::LoadSprite { url } => {
            let key = format!("sprite_{url}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match queries.sprite(&url).await {
                    Ok(sprite) => Action::SpriteDidLoad { url, sprite },
                    Err(error) => Action::SpriteDidError {
                        url,
                        error: error.to_string(),
                    },
                }
            });
        }
    }
}
