//! Login flow against a scripted session on the real clock.
//!
//! Run with `WAITLINE_LOG=debug cargo run --example login_flow` to see every
//! poll tick.

use std::sync::Arc;
use std::time::Duration;
use waitline::logging::init_logging_from;
use waitline::prelude::*;
use waitline::{Clock, SystemClock};

fn main() -> WaitResult<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let session = ScriptedSession::new().with_clock(clock.clone());
    session.add(
        Selector::css("form#login"),
        ScriptedElement::new("login-form", "form").visible_after(Duration::from_millis(400)),
    );
    session.add(Selector::id("username"), ScriptedElement::new("username", "input"));
    session.add(Selector::id("password"), ScriptedElement::new("password", "input"));
    session.add(
        Selector::css("button[type=submit]"),
        ScriptedElement::new("submit", "button").enabled_after(Duration::from_millis(900)),
    );
    session.add(
        Selector::css(".dashboard h1"),
        ScriptedElement::new("welcome", "h1")
            .text("Welcome back")
            .appears_after(Duration::from_millis(1300)),
    );
    session.fail_act("submit", WaitError::stale("button[type=submit]"));

    let config = WaitConfig::new()
        .with_timeout_ms(3_000)
        .with_interval_ms(100)
        .apply_env()?;
    let _ = init_logging_from(&config);

    let poller = Poller::from_config(&session, &config)?
        .with_clock(clock)
        .with_observer(Arc::new(TracingObserver));

    let page = SimplePage::new("login", Selector::css("form#login"))
        .with_target("username", Selector::id("username"))
        .with_target("password", Selector::id("password"))
        .with_target("submit", Selector::css("button[type=submit]"));

    wait_until_loaded(&poller, &page).into_result()?;
    type_text(&poller, page.target("username")?, "demo", TypeOptions::default())?;
    type_text(&poller, page.target("password")?, "hunter2", TypeOptions::submit())?;
    let report = poller.click(page.target("submit")?)?;
    let welcome = text_of(&poller, &Target::css(".dashboard h1"))?;
    let form_gone = verify_not_displayed(&poller, &Target::css("form#login"))?;

    println!(
        "clicked submit after {} attempts in {:?}; page says {welcome:?}; login form gone: {form_gone}",
        report.attempts, report.elapsed
    );
    Ok(())
}
