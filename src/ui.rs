//! Iced application — messages, update handlers and view code.
//!
//! Architecture overview
//! ─────────────────────
//! The app follows the Elm/MVU pattern enforced by Iced 0.13:
//!
//!   * `App`            — owns the `Dashboard` state object and the gateway.
//!   * `Message`        — every possible event (user action, timer tick,
//!                        async task result).
//!   * `App::update()`  — hands the event to `Dashboard` and turns whatever it
//!                        asks for (a refresh cycle, a transfer, a history
//!                        load) into a `Task`.
//!   * `App::view()`    — draws the render surface; it never reads the store
//!                        directly except for the mode switch.
//!   * `App::subscription()` — poll timer (only while armed) and the notice
//!                        expiry timer.
//!
//! All network work runs in `Task`s on the tokio executor, one refresh cycle
//! at a time, so the UI thread never blocks.

use std::{sync::Arc, time::{Duration, Instant}};

use iced::{
    font::Font,
    time,
    widget::{
        button, checkbox, column, container, keyed_column, pick_list, row, scrollable, text,
        text_input, Space,
    },
    Alignment, Color, Element, Length, Padding, Subscription, Task,
};
use tracing::{info, warn};

use crate::{
    commands::{self, BatchOutcome, TransferOutcome},
    config::Config,
    dashboard::{Confirmation, Dashboard, NoticeKind},
    gateway::{GatewayError, HttpGateway},
    model::AccountHistory,
    progress::{StepMarker, StepState},
    scheduler::{self, CycleReport, CycleRequest},
    surface::{
        AccountRow, AccountsRegion, HistoryPanel, HistoryView, PickerOption, PickerSlot,
        WorkflowCard, WorkflowRegion, NO_ACTIVE_WORKFLOWS, NO_COMPLETED_WORKFLOWS,
    },
};

// ── Colour palette ────────────────────────────────────────────────────────────

const BG:       Color = Color { r: 0.949, g: 0.949, b: 0.969, a: 1.0 }; // #f2f2f7
const PANEL:    Color = Color { r: 1.0,   g: 1.0,   b: 1.0,   a: 1.0 }; // white
const BORDER:   Color = Color { r: 0.820, g: 0.820, b: 0.839, a: 1.0 }; // #d1d1d6
const ROW_ALT:  Color = Color { r: 0.976, g: 0.976, b: 0.984, a: 1.0 }; // #f9f9fb
const GREEN:    Color = Color { r: 0.204, g: 0.780, b: 0.349, a: 1.0 }; // #34c759
const OFF:      Color = Color { r: 0.820, g: 0.820, b: 0.839, a: 1.0 }; // #d1d1d6
const MAC_BLUE: Color = Color { r: 0.0,   g: 0.478, b: 1.0,   a: 1.0 }; // #007aff
const MAC_RED:  Color = Color { r: 1.0,   g: 0.231, b: 0.188, a: 1.0 }; // #ff3b30
const MAC_ORG:  Color = Color { r: 1.0,   g: 0.584, b: 0.0,   a: 1.0 }; // #ff9500
const TEXT_SEC: Color = Color { r: 0.282, g: 0.282, b: 0.290, a: 1.0 }; // #48484a
const TEXT_TER: Color = Color { r: 0.557, g: 0.557, b: 0.576, a: 1.0 }; // #8e8e93

const BOLD: Font = Font { weight: iced::font::Weight::Bold, ..Font::DEFAULT };

// ── Message ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Message {
    // ── Timer ticks ──────────────────────────────────────────────────────────
    /// Poll cadence; dropped by the scheduler while a cycle is in flight.
    PollTick,
    /// 1 s — expire the notice banner.
    NoticeTick,

    // ── Refresh cycle ────────────────────────────────────────────────────────
    CycleFinished(CycleReport),
    RefreshNow,
    ToggleAutoRefresh(bool),
    ConfigSaved(Result<(), String>),

    // ── Transfer form ────────────────────────────────────────────────────────
    PickerOpened(PickerSlot),
    PickerClosed(PickerSlot),
    FromSelected(PickerOption),
    ToSelected(PickerOption),
    AmountChanged(String),
    SubmitTransfer,
    TransferFinished(TransferOutcome),

    // ── Mode / batch ─────────────────────────────────────────────────────────
    ToggleMode(bool),
    ModeSaved(bool, Result<(), GatewayError>),
    StartBatch,
    BatchFinished(BatchOutcome),

    // ── Destructive actions (behind a confirmation) ──────────────────────────
    RequestReset,
    RequestClearHistory,
    ConfirmAccepted,
    ConfirmDismissed,
    ResetFinished(Result<(), GatewayError>),
    HistoryCleared(Result<(), GatewayError>),

    // ── Account history panels ───────────────────────────────────────────────
    ToggleHistory(String),
    HistoryLoaded(String, Result<AccountHistory, GatewayError>),

    DismissNotice,
}

// ── App state ─────────────────────────────────────────────────────────────────

pub struct App {
    dashboard: Dashboard,
    gateway:   Arc<HttpGateway>,
}

impl App {
    /// Build the app and the start-up refresh cycle.
    pub fn new(config: Config, gateway: HttpGateway) -> (Self, Task<Message>) {
        let mut app = Self {
            dashboard: Dashboard::new(config),
            gateway:   Arc::new(gateway),
        };
        let initial = app.dashboard.initial_cycle();
        let task = app.run_cycle(initial);
        (app, task)
    }

    pub fn title(&self) -> String {
        "Money Transfer Dashboard".into()
    }

    // ── Task helpers ──────────────────────────────────────────────────────────

    fn run_cycle(&self, request: Option<CycleRequest>) -> Task<Message> {
        match request {
            Some(request) => Task::perform(
                scheduler::run_cycle(Arc::clone(&self.gateway), request),
                Message::CycleFinished,
            ),
            None => Task::none(),
        }
    }

    fn save_config(&self) -> Task<Message> {
        let config = self.dashboard.config().clone();
        Task::perform(
            async move { config.save().map_err(|e| format!("{e:#}")) },
            Message::ConfigSaved,
        )
    }

    // ── update ────────────────────────────────────────────────────────────────

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let now = Instant::now();
        match message {
            // ── Refresh cycle ─────────────────────────────────────────────────
            Message::PollTick => {
                let request = self.dashboard.on_poll_tick();
                self.run_cycle(request)
            }

            Message::CycleFinished(report) => {
                let follow_up = self.dashboard.apply_cycle(report);
                self.run_cycle(follow_up)
            }

            Message::RefreshNow => {
                let request = self.dashboard.request_refresh();
                self.run_cycle(request)
            }

            Message::ToggleAutoRefresh(enabled) => {
                if self.dashboard.set_auto_refresh(enabled) {
                    self.save_config()
                } else {
                    Task::none()
                }
            }

            Message::ConfigSaved(result) => {
                match result {
                    Ok(()) => info!(path = %Config::config_file_path().display(), "config saved"),
                    Err(e) => warn!(error = %e, "failed to save config"),
                }
                Task::none()
            }

            Message::NoticeTick => {
                self.dashboard.expire_notice(now);
                Task::none()
            }

            Message::DismissNotice => {
                self.dashboard.dismiss_notice();
                Task::none()
            }

            // ── Transfer form ─────────────────────────────────────────────────
            Message::PickerOpened(slot) => { self.dashboard.picker_opened(slot); Task::none() }
            Message::PickerClosed(slot) => { self.dashboard.picker_closed(slot); Task::none() }
            Message::FromSelected(o)    => { self.dashboard.select_account(PickerSlot::From, o.account_id); Task::none() }
            Message::ToSelected(o)      => { self.dashboard.select_account(PickerSlot::To, o.account_id); Task::none() }
            Message::AmountChanged(s)   => { self.dashboard.set_amount(s); Task::none() }

            Message::SubmitTransfer => match self.dashboard.prepare_transfer(now) {
                Some(request) => Task::perform(
                    commands::submit_transfer(Arc::clone(&self.gateway), request),
                    Message::TransferFinished,
                ),
                None => Task::none(),
            },

            Message::TransferFinished(outcome) => {
                self.dashboard.finish_transfer(outcome, now);
                Task::none()
            }

            // ── Mode / batch ──────────────────────────────────────────────────
            Message::ToggleMode(enabled) => {
                let requested = self.dashboard.toggle_mode(enabled);
                Task::perform(
                    commands::save_mode(Arc::clone(&self.gateway), requested),
                    move |result| Message::ModeSaved(requested, result),
                )
            }

            Message::ModeSaved(requested, result) => {
                self.dashboard.finish_mode_change(requested, result, now);
                Task::none()
            }

            Message::StartBatch => match self.dashboard.begin_batch() {
                Some(transfers) => Task::perform(
                    commands::run_batch(Arc::clone(&self.gateway), transfers),
                    Message::BatchFinished,
                ),
                None => Task::none(),
            },

            Message::BatchFinished(outcome) => {
                self.dashboard.finish_batch(outcome, now);
                Task::none()
            }

            // ── Destructive actions ───────────────────────────────────────────
            Message::RequestReset => {
                self.dashboard.request_confirmation(Confirmation::Reset);
                Task::none()
            }

            Message::RequestClearHistory => {
                self.dashboard.request_confirmation(Confirmation::ClearHistory);
                Task::none()
            }

            Message::ConfirmDismissed => {
                self.dashboard.dismiss_confirmation();
                Task::none()
            }

            Message::ConfirmAccepted => match self.dashboard.accept_confirmation() {
                Some(Confirmation::Reset) => Task::perform(
                    commands::reset_state(Arc::clone(&self.gateway)),
                    Message::ResetFinished,
                ),
                Some(Confirmation::ClearHistory) => Task::perform(
                    commands::clear_history(Arc::clone(&self.gateway)),
                    Message::HistoryCleared,
                ),
                None => Task::none(),
            },

            Message::ResetFinished(result) => {
                let request = self.dashboard.finish_reset(result, now);
                self.run_cycle(request)
            }

            Message::HistoryCleared(result) => {
                self.dashboard.finish_clear_history(result, now);
                Task::none()
            }

            // ── Account history panels ────────────────────────────────────────
            Message::ToggleHistory(account_id) => match self.dashboard.toggle_history(&account_id) {
                Some(account_id) => Task::perform(
                    commands::load_history(Arc::clone(&self.gateway), account_id),
                    |(account_id, result)| Message::HistoryLoaded(account_id, result),
                ),
                None => Task::none(),
            },

            Message::HistoryLoaded(account_id, result) => {
                self.dashboard.finish_history_load(&account_id, result);
                Task::none()
            }
        }
    }

    // ── subscription ──────────────────────────────────────────────────────────

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subs = Vec::with_capacity(2);
        // The timer only exists while armed; the interval is part of its
        // identity, so re-arming never stacks a second timer.
        if self.dashboard.scheduler().is_armed() {
            subs.push(time::every(self.dashboard.refresh_interval()).map(|_| Message::PollTick));
        }
        if self.dashboard.notice().is_some() {
            subs.push(time::every(Duration::from_secs(1)).map(|_| Message::NoticeTick));
        }
        Subscription::batch(subs)
    }

    // ── view ──────────────────────────────────────────────────────────────────

    pub fn view(&self) -> Element<'_, Message> {
        let left = column![
            self.view_accounts_panel(),
            self.view_transfer_panel(),
            self.view_actions_panel(),
        ]
        .spacing(12)
        .width(Length::FillPortion(2));

        let right = column![
            self.view_workflow_panel("RUNNING WORKFLOWS", &self.dashboard.surface().running, NO_ACTIVE_WORKFLOWS, None),
            self.view_workflow_panel(
                "WORKFLOW HISTORY",
                &self.dashboard.surface().terminal,
                NO_COMPLETED_WORKFLOWS,
                Some(styled_button("Clear History", ButtonStyle::Secondary).on_press(Message::RequestClearHistory)),
            ),
        ]
        .spacing(12)
        .width(Length::FillPortion(3));

        let body = scrollable(
            row![left, right]
                .spacing(12)
                .padding(16),
        )
        .height(Length::Fill);

        let mut content = column![self.view_toolbar(), horizontal_rule()];
        if let Some(banner) = self.view_notice() {
            content = content.push(banner);
        }
        let content = content.push(body).width(Length::Fill).height(Length::Fill);

        // Confirmation dialog (modal-like)
        if let Some(confirmation) = self.dashboard.confirmation() {
            view_overlay(confirmation)
        } else {
            container(content)
                .width(Length::Fill)
                .height(Length::Fill)
                .style(|_| container::Style {
                    background: Some(BG.into()),
                    ..Default::default()
                })
                .into()
        }
    }

    // ── Toolbar ───────────────────────────────────────────────────────────────

    fn view_toolbar(&self) -> Element<'_, Message> {
        let polling = self.dashboard.scheduler().state() == scheduler::PollState::Polling;

        let toolbar_row = row![
            text("Money Transfer Dashboard").size(18).font(BOLD).color(Color::BLACK),
            Space::with_width(Length::Fill),
            checkbox("Real World Mode", self.dashboard.store().mode_enabled())
                .on_toggle(Message::ToggleMode)
                .size(14)
                .text_size(12),
            Space::with_width(16),
            checkbox("Auto-refresh", self.dashboard.scheduler().is_armed())
                .on_toggle(Message::ToggleAutoRefresh)
                .size(14)
                .text_size(12),
            Space::with_width(8),
            indicator_badge("Syncing", polling),
            Space::with_width(12),
            styled_button("Refresh", ButtonStyle::Secondary).on_press(Message::RefreshNow),
        ]
        .align_y(Alignment::Center)
        .padding(Padding::from([0, 16]));

        container(toolbar_row)
            .width(Length::Fill)
            .height(56)
            .align_y(Alignment::Center)
            .style(|_| container::Style {
                background: Some(PANEL.into()),
                ..Default::default()
            })
            .into()
    }

    fn view_notice(&self) -> Option<Element<'_, Message>> {
        let notice = self.dashboard.notice()?;
        let accent = match notice.kind {
            NoticeKind::Success => GREEN,
            NoticeKind::Error => MAC_RED,
        };
        let banner = row![
            text(notice.text.as_str()).size(12).color(Color::WHITE),
            Space::with_width(Length::Fill),
            button(text("✕").size(11).color(Color::WHITE))
                .padding(Padding::from([2, 8]))
                .style(|_, _| button::Style {
                    background: None,
                    text_color: Color::WHITE,
                    ..Default::default()
                })
                .on_press(Message::DismissNotice),
        ]
        .align_y(Alignment::Center)
        .padding(Padding::from([8, 16]));

        Some(
            container(banner)
                .width(Length::Fill)
                .style(move |_| container::Style {
                    background: Some(accent.into()),
                    ..Default::default()
                })
                .into(),
        )
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    fn view_accounts_panel(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.dashboard.surface().accounts {
            AccountsRegion::Pending => placeholder("Loading accounts..."),
            AccountsRegion::NoAccounts => placeholder("No accounts found"),
            AccountsRegion::Error(msg) => text(msg.as_str()).size(12).color(MAC_RED).into(),
            AccountsRegion::Rows(rows) => keyed_column(
                rows.iter().map(|r| (r.handle, view_account_row(r))),
            )
            .spacing(4)
            .into(),
        };
        panel("ACCOUNTS", None, body)
    }

    // ── Transfer form ─────────────────────────────────────────────────────────

    fn view_transfer_panel(&self) -> Element<'_, Message> {
        let surface = self.dashboard.surface();

        let from = pick_list(
            surface.from_picker.options.as_slice(),
            surface.from_picker.selected_option(),
            Message::FromSelected,
        )
        .placeholder("Select account...")
        .on_open(Message::PickerOpened(PickerSlot::From))
        .on_close(Message::PickerClosed(PickerSlot::From))
        .text_size(12)
        .width(Length::Fill);

        let to = pick_list(
            surface.to_picker.options.as_slice(),
            surface.to_picker.selected_option(),
            Message::ToSelected,
        )
        .placeholder("Select account...")
        .on_open(Message::PickerOpened(PickerSlot::To))
        .on_close(Message::PickerClosed(PickerSlot::To))
        .text_size(12)
        .width(Length::Fill);

        let amount = text_input("Amount", self.dashboard.amount())
            .on_input(Message::AmountChanged)
            .on_submit(Message::SubmitTransfer)
            .padding(Padding::from([4, 6]))
            .size(12);

        let form = column![
            form_row("From", from.into()),
            form_row("To", to.into()),
            form_row("Amount ($)", amount.into()),
            row![
                Space::with_width(Length::Fill),
                styled_button("Send Transfer", ButtonStyle::Primary).on_press(Message::SubmitTransfer),
            ]
            .padding(Padding::from([8, 0])),
        ]
        .spacing(6);

        panel("NEW TRANSFER", None, form.into())
    }

    fn view_actions_panel(&self) -> Element<'_, Message> {
        let batch_label = if self.dashboard.batch_running() { "Starting batch…" } else { "Start Daily Batch" };
        let batch = styled_button(batch_label, ButtonStyle::Warning)
            .on_press_maybe((!self.dashboard.batch_running()).then_some(Message::StartBatch));
        let reset = styled_button("Reset Database", ButtonStyle::Destructive).on_press(Message::RequestReset);

        let actions = row![batch, Space::with_width(8), reset].align_y(Alignment::Center);
        panel("ACTIONS", None, actions.into())
    }

    // ── Workflows ─────────────────────────────────────────────────────────────

    fn view_workflow_panel<'a>(
        &'a self,
        title:  &'a str,
        region: &'a WorkflowRegion,
        empty:  &'a str,
        action: Option<button::Button<'a, Message>>,
    ) -> Element<'a, Message> {
        let body: Element<'a, Message> = match region {
            WorkflowRegion::Empty => placeholder(empty),
            WorkflowRegion::Cards(cards) => column(cards.iter().map(view_workflow_card)).spacing(8).into(),
        };
        panel(title, action.map(Element::from), body)
    }
}

// ── Account row ───────────────────────────────────────────────────────────────

fn view_account_row(row_data: &AccountRow) -> Element<'_, Message> {
    let chevron = if row_data.expanded { "▾" } else { "▸" };
    let header = button(
        row![
            text(chevron).size(12).color(TEXT_TER),
            Space::with_width(6),
            text(row_data.account_id.as_str()).size(13).color(Color::BLACK),
            Space::with_width(Length::Fill),
            text(row_data.balance_text.as_str()).size(13).font(BOLD).color(Color::BLACK),
        ]
        .align_y(Alignment::Center),
    )
    .width(Length::Fill)
    .padding(Padding::from([6, 8]))
    .style(|_, status| button::Style {
        background: Some(match status {
            button::Status::Hovered | button::Status::Pressed => BG.into(),
            _ => ROW_ALT.into(),
        }),
        text_color: Color::BLACK,
        border: iced::Border { color: BORDER, width: 1.0, radius: 6.0.into() },
        shadow: iced::Shadow::default(),
    })
    .on_press(Message::ToggleHistory(row_data.account_id.clone()));

    if !row_data.expanded {
        return header.into();
    }

    let history: Element<'_, Message> = match &row_data.history {
        HistoryPanel::Loading => placeholder("Loading history..."),
        HistoryPanel::Failed => text("Failed to load history").size(11).color(MAC_RED).into(),
        HistoryPanel::Loaded(view) => view_history(view),
    };

    column![
        header,
        container(history).padding(Padding { top: 4.0, right: 8.0, bottom: 8.0, left: 24.0 }),
    ]
    .into()
}

fn view_history(view: &HistoryView) -> Element<'_, Message> {
    let net_color = if view.net_positive { GREEN } else { MAC_RED };
    let summary = row![
        stat("SENT", text(view.sent_text.as_str()).size(12).color(Color::BLACK).into()),
        stat("RECEIVED", text(view.received_text.as_str()).size(12).color(Color::BLACK).into()),
        stat("NET", text(view.net_text.as_str()).size(12).color(net_color).into()),
        stat("COUNT", text(view.count_text.as_str()).size(12).color(Color::BLACK).into()),
    ]
    .spacing(16);

    let mut list = column![summary].spacing(4);
    if view.entries.is_empty() {
        list = list.push(placeholder("No transactions"));
    }
    for entry in &view.entries {
        list = list.push(
            row![
                text(entry.direction_icon()).size(11).color(TEXT_SEC),
                text(entry.counterparty.as_str()).size(11).color(TEXT_SEC),
                Space::with_width(Length::Fill),
                text(entry.amount_text.as_str()).size(11).font(Font::MONOSPACE).color(Color::BLACK),
                text(entry.status_icon).size(11),
            ]
            .spacing(6)
            .align_y(Alignment::Center),
        );
    }
    if let Some(more) = &view.more {
        list = list.push(text(more.as_str()).size(10).color(TEXT_TER));
    }
    list.into()
}

// ── Workflow card ─────────────────────────────────────────────────────────────

fn view_workflow_card(card: &WorkflowCard) -> Element<'_, Message> {
    let header = row![
        text(card.status_icon()).size(13),
        Space::with_width(6),
        text(card.workflow_id.as_str()).size(12).font(Font::MONOSPACE).color(Color::BLACK),
        Space::with_width(Length::Fill),
        text(card.status.to_string()).size(10).color(TEXT_TER),
    ]
    .align_y(Alignment::Center);

    let transfer = text(format!("{} → {}  {}", card.from, card.to, card.amount_text))
        .size(12)
        .color(TEXT_SEC);

    let steps = row(card.steps.iter().map(view_step)).spacing(12);

    let mut body = column![header, transfer, steps].spacing(4);
    if let Some((started, closed)) = &card.timestamps {
        body = body.push(
            text(format!("Started: {started}   Closed: {closed}")).size(10).color(TEXT_TER),
        );
    }
    if let Some(result) = &card.result_text {
        let color = if card.status == crate::model::WorkflowStatus::Failed { MAC_RED } else { TEXT_SEC };
        body = body.push(text(result.as_str()).size(11).color(color));
    }

    container(body)
        .width(Length::Fill)
        .padding(10)
        .style(|_| container::Style {
            background: Some(ROW_ALT.into()),
            border: iced::Border { color: BORDER, width: 1.0, radius: 8.0.into() },
            ..Default::default()
        })
        .into()
}

fn view_step(marker: &StepMarker) -> Element<'_, Message> {
    let color = match marker.state {
        StepState::Completed => GREEN,
        StepState::Current => MAC_BLUE,
        StepState::Pending => OFF,
    };
    row![
        text(marker.state.icon()).size(11).color(color),
        Space::with_width(4),
        text(marker.label.as_str()).size(10).color(TEXT_SEC),
    ]
    .align_y(Alignment::Center)
    .into()
}

// ── Overlay (modal dialog) ────────────────────────────────────────────────────

fn view_overlay<'a>(confirmation: Confirmation) -> Element<'a, Message> {
    let confirm_style = match confirmation {
        Confirmation::Reset => ButtonStyle::Destructive,
        Confirmation::ClearHistory => ButtonStyle::Primary,
    };
    let buttons = row![
        styled_button("Cancel", ButtonStyle::Secondary).on_press(Message::ConfirmDismissed),
        styled_button("OK", confirm_style).on_press(Message::ConfirmAccepted),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let dialog = container(
        column![
            text(confirmation.prompt()).size(14).color(Color::BLACK),
            Space::with_height(16),
            buttons,
        ]
        .spacing(0)
        .padding(24)
        .width(440),
    )
    .style(|_| container::Style {
        background: Some(Color::WHITE.into()),
        border: iced::Border { color: BORDER, width: 1.0, radius: 12.0.into() },
        shadow: iced::Shadow {
            color: Color { r: 0.0, g: 0.0, b: 0.0, a: 0.25 },
            offset: iced::Vector { x: 0.0, y: 4.0 },
            blur_radius: 20.0,
        },
        ..Default::default()
    });

    container(dialog)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(Alignment::Center)
        .align_y(Alignment::Center)
        .style(|_| container::Style {
            background: Some(Color { r: 0.0, g: 0.0, b: 0.0, a: 0.4 }.into()),
            ..Default::default()
        })
        .into()
}

// ── Widget helpers ────────────────────────────────────────────────────────────

fn panel<'a>(
    title:  &'a str,
    action: Option<Element<'a, Message>>,
    body:   Element<'a, Message>,
) -> Element<'a, Message> {
    let mut header = row![text(title).size(10).color(TEXT_TER), Space::with_width(Length::Fill)]
        .align_y(Alignment::Center);
    if let Some(action) = action {
        header = header.push(action);
    }

    container(column![header, horizontal_rule(), body].spacing(8))
        .width(Length::Fill)
        .padding(Padding::from([12, 16]))
        .style(|_| container::Style {
            background: Some(PANEL.into()),
            border: iced::Border { color: BORDER, width: 1.0, radius: 10.0.into() },
            ..Default::default()
        })
        .into()
}

fn horizontal_rule<'a>() -> Element<'a, Message> {
    container(Space::with_height(1))
        .width(Length::Fill)
        .style(|_| container::Style {
            background: Some(BORDER.into()),
            ..Default::default()
        })
        .into()
}

fn placeholder(label: &str) -> Element<'_, Message> {
    text(label).size(12).color(TEXT_TER).into()
}

fn form_row<'a>(label: &'a str, field: Element<'a, Message>) -> Element<'a, Message> {
    row![text(label).size(11).color(TEXT_SEC).width(80), field]
        .align_y(Alignment::Center)
        .spacing(4)
        .into()
}

fn stat<'a>(label: &'a str, value: Element<'a, Message>) -> Element<'a, Message> {
    column![text(label).size(9).color(TEXT_TER), value].spacing(2).into()
}

fn indicator_badge<'a>(label: &'a str, active: bool) -> Element<'a, Message> {
    let dot_color = if active { GREEN } else { OFF };
    row![
        text("●").size(12).color(dot_color),
        Space::with_width(4),
        text(label).size(11).color(TEXT_SEC),
    ]
    .align_y(Alignment::Center)
    .into()
}

// ── Button styling ────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum ButtonStyle {
    Primary,
    Secondary,
    Destructive,
    Warning,
}

fn styled_button(label: &str, style: ButtonStyle) -> button::Button<'_, Message> {
    let (bg, hover_bg, fg) = match style {
        ButtonStyle::Primary     => (MAC_BLUE,                          darken(MAC_BLUE), Color::WHITE),
        ButtonStyle::Secondary   => (Color{r:0.898,g:0.898,b:0.918,a:1.0}, Color{r:0.847,g:0.847,b:0.871,a:1.0}, Color::BLACK),
        ButtonStyle::Destructive => (MAC_RED,                           darken(MAC_RED),  Color::WHITE),
        ButtonStyle::Warning     => (MAC_ORG,                           darken(MAC_ORG),  Color::WHITE),
    };

    button(text(label).size(11).color(fg))
        .padding(Padding::from([5, 14]))
        .style(move |_, status| button::Style {
            background: Some(match status {
                button::Status::Hovered | button::Status::Pressed => hover_bg.into(),
                button::Status::Disabled => OFF.into(),
                _ => bg.into(),
            }),
            text_color: fg,
            border: iced::Border { color: Color::TRANSPARENT, width: 0.0, radius: 6.0.into() },
            shadow: iced::Shadow::default(),
        })
}

// ── Colour utilities ──────────────────────────────────────────────────────────

fn darken(c: Color) -> Color {
    Color {
        r: (c.r * 0.85).min(1.0),
        g: (c.g * 0.85).min(1.0),
        b: (c.b * 0.85).min(1.0),
        a: c.a,
    }
}
