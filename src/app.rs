use gloo_timers::future::TimeoutFuture;
use leptos::ev::{MouseEvent, SubmitEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};
use rand::prelude::*;
use rand::rng;

use crate::api::HttpSantaApi;
use crate::form::{self, FormHandle, JoinForm, Screen, NOTICE_TTL_MS};

const SNOWFLAKES: usize = 20;

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        // id=leptos means cargo-leptos will hot-reload this stylesheet
        <Stylesheet id="leptos" href="/pkg/secret-santa.css" />

        <Title text="Secret Santa" />

        <Router>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=SecretSanta />
                </Routes>
            </main>
        </Router>
    }
}

/// The whole page: header, then either the join form or the result, a toast for errors and some
/// decoration.
#[component]
fn SecretSanta() -> impl IntoView {
    let api = HttpSantaApi::default();
    let state = RwSignal::new(JoinForm::default());
    let screen = Memo::new(move |_| state.with(|f| f.screen()));

    // Runs once, in the browser.
    Effect::new(move || {
        spawn_local(async move {
            form::refresh_count(&api, &state).await;
        });
    });

    view! {
        <div class="santa-page">
            <Snowfall />
            <div class="santa-ground" />

            <div class="santa-container">
                <header class="santa-header">
                    <div class="santa-title">
                        <span class="pulse">"🎅"</span>
                        <h1>"Secret Santa"</h1>
                        <span class="pulse">"🎄"</span>
                    </div>
                    <p class="tagline">
                        "Join the game and find out who you will be giving a gift to!"
                    </p>
                </header>

                {move || match screen.get() {
                    Screen::Form => view! { <JoinCard state api /> }.into_any(),
                    Screen::Assignment | Screen::Waiting => {
                        view! { <ResultCard state api /> }.into_any()
                    }
                }}

                <div class="santa-footer">
                    {["🎄", "✨", "🎁", "⭐"]
                        .into_iter()
                        .enumerate()
                        .map(|(i, icon)| {
                            view! {
                                <span
                                    class="bounce"
                                    style=format!("animation-delay: {:.1}s", i as f32 * 0.1)
                                >
                                    {icon}
                                </span>
                            }
                        })
                        .collect_view()}
                </div>
            </div>

            <NoticeToast state />
        </div>
    }
}

#[component]
fn JoinCard(state: RwSignal<JoinForm>, api: HttpSantaApi) -> impl IntoView {
    let loading = Memo::new(move |_| state.with(|f| f.loading));

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        spawn_local(async move {
            form::submit(&api, &state).await;
        });
    };

    view! {
        <div class="card">
            <div class="card-header">
                <h2 class="card-title">"Join the game"</h2>
                <p class="card-description">
                    "Participants in the game: "
                    <span class="count">{move || state.with(|f| f.participant_count)}</span>
                </p>
            </div>
            // Enter in the input submits the form.
            <form class="card-content" on:submit=submit>
                <label for="santa-name">"Your first or last name"</label>
                <input
                    id="santa-name"
                    type="text"
                    placeholder="For example: Ivan or Petrov"
                    prop:value=move || state.with(|f| f.name.clone())
                    on:input=move |ev| state.update(|f| f.set_name(event_target_value(&ev)))
                />
                {move || {
                    state
                        .with(|f| f.validation_error.clone())
                        .map(|message| view! { <p class="field-error">{message}</p> })
                }}
                <button type="submit" class="btn btn-primary" disabled=move || loading.get()>
                    {move || {
                        if loading.get() {
                            view! {
                                <span class="spinner" />
                                "Connecting..."
                            }
                                .into_any()
                        } else {
                            view! {
                                <span class="icon">"🎁"</span>
                                "Join"
                            }
                                .into_any()
                        }
                    }}
                </button>
            </form>
        </div>
    }
}

#[component]
fn ResultCard(state: RwSignal<JoinForm>, api: HttpSantaApi) -> impl IntoView {
    let result = move || state.with(|f| f.result.clone());

    let back = move |_: MouseEvent| {
        spawn_local(async move {
            form::reset(&api, &state).await;
        });
    };

    view! {
        <div class="card">
            <div class="card-header">
                <h2 class="card-title">
                    "Hello, "
                    {move || result().map(|r| r.participant_name).unwrap_or_default()}
                    "! 👋"
                </h2>
            </div>
            <div class="card-content">
                {move || match result().and_then(|r| r.giver_to) {
                    Some(recipient) => {
                        view! {
                            <div class="assignment">
                                <div class="assignment-panel">
                                    <p class="lead">"You are giving a gift to:"</p>
                                    <p class="recipient pulse">{recipient}</p>
                                    <div class="gift">"🎁"</div>
                                </div>
                                <p class="hint">"It's a secret! Don't tell anyone 🤫"</p>
                            </div>
                        }
                            .into_any()
                    }
                    None => {
                        view! {
                            <div class="waiting">
                                <div class="waiting-panel">
                                    <div class="waiting-icon">"👥"</div>
                                    <p class="lead">"Waiting for more participants..."</p>
                                    <p class="hint">"At least 2 participants are needed"</p>
                                </div>
                            </div>
                        }
                            .into_any()
                    }
                }}
                <button type="button" class="btn btn-outline" on:click=back>
                    "← Back"
                </button>
            </div>
        </div>
    }
}

/// Shows the current notice and dismisses it after `NOTICE_TTL_MS`.
#[component]
fn NoticeToast(state: RwSignal<JoinForm>) -> impl IntoView {
    let notice_id = Memo::new(move |_| state.with(|f| f.notice.as_ref().map(|n| n.id)));

    Effect::new(move || {
        if let Some(id) = notice_id.get() {
            spawn_local(async move {
                TimeoutFuture::new(NOTICE_TTL_MS).await;
                state.with_form(|f| f.dismiss_notice(id));
            });
        }
    });

    view! {
        <div class="toast-area">
            {move || {
                state
                    .with(|f| f.notice.clone())
                    .map(|notice| {
                        let id = notice.id;
                        view! {
                            <div class="toast toast-destructive" role="alert">
                                <div class="toast-body">
                                    <p class="toast-title">{notice.title}</p>
                                    <p class="toast-message">{notice.message}</p>
                                </div>
                                <button
                                    type="button"
                                    class="toast-close"
                                    aria-label="Close"
                                    on:click=move |_: MouseEvent| {
                                        state.with_form(|f| f.dismiss_notice(id));
                                    }
                                >
                                    "×"
                                </button>
                            </div>
                        }
                    })
            }}
        </div>
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Snowflake {
    left_pct: f32,
    size_px: f32,
    delay_s: f32,
    duration_s: f32,
}

impl Snowflake {
    fn style(&self) -> String {
        format!(
            "left: {:.1}%; font-size: {:.0}px; animation-delay: {:.2}s; animation-duration: {:.2}s",
            self.left_pct, self.size_px, self.delay_s, self.duration_s
        )
    }
}

fn scatter_snowflakes<R: Rng>(rng: &mut R, count: usize) -> Vec<Snowflake> {
    (0..count)
        .map(|_| Snowflake {
            left_pct: rng.random_range(0.0..100.0),
            size_px: rng.random_range(10.0..20.0),
            delay_s: rng.random_range(0.0..10.0),
            duration_s: rng.random_range(8.0..14.0),
        })
        .collect()
}

#[component]
fn Snowfall() -> impl IntoView {
    let flakes = RwSignal::new(Vec::<Snowflake>::new());

    // Scattered on the client only, so the server-rendered markup never disagrees with it.
    Effect::new(move || {
        let mut rng = rng();
        flakes.set(scatter_snowflakes(&mut rng, SNOWFLAKES));
    });

    view! {
        <div class="snowfall" aria-hidden="true">
            {move || {
                flakes
                    .get()
                    .into_iter()
                    .map(|flake| view! { <div class="snowflake" style=flake.style()>"❄️"</div> })
                    .collect_view()
            }}
        </div>
    }
}
