//! Final score screen: a count-up to the score, then a short confetti burst drawn
//! around it.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng};
use teloxide::{
    payloads::EditMessageTextSetters,
    prelude::Requester,
    types::{ChatId, MessageId, ParseMode},
    Bot,
};
use tokio::time::{interval, sleep_until, Instant};
use tracing::{debug, instrument, warn};

pub const COUNT_UP_STEP: Duration = Duration::from_millis(20);
pub const BURST_INTERVAL: Duration = Duration::from_millis(200);
pub const BURST_DURATION: Duration = Duration::from_millis(1000);
pub const PARTICLES_PER_BURST: usize = 30;
/// Degrees either side of straight up, combined.
pub const SPREAD: f64 = 90.0;
pub const START_VELOCITY: f64 = 20.0;

const CANVAS_WIDTH: usize = 21;
const CANVAS_HEIGHT: usize = 6;
const GLYPHS: [char; 5] = ['*', '+', 'o', '~', '^'];

/// Displayed values from 1 up to the target, one per step.
#[derive(Debug, Clone)]
pub struct CountUp {
    next: u32,
    target: u32,
    done: bool,
}

impl CountUp {
    pub fn new(target: u32) -> Self {
        Self {
            next: 1,
            target,
            done: false,
        }
    }
}

impl Iterator for CountUp {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.done {
            return None;
        }
        if self.next >= self.target {
            self.done = true;
            return Some(self.target);
        }

        let value = self.next;
        self.next += 1;
        Some(value)
    }
}

/// Offsets from the end of the count-up at which bursts go off.
pub fn burst_schedule() -> Vec<Duration> {
    (1..)
        .map(|n| BURST_INTERVAL * n)
        .take_while(|offset| *offset < BURST_DURATION)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Degrees, 90 is straight up.
    pub angle: f64,
    pub velocity: f64,
    pub glyph: char,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub particles: Vec<Particle>,
}

impl Burst {
    pub fn scatter<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let particles = (0..PARTICLES_PER_BURST)
            .map(|_| Particle {
                angle: 90.0 + rng.gen_range(-SPREAD / 2.0..=SPREAD / 2.0),
                velocity: START_VELOCITY * rng.gen_range(0.5..=1.0),
                glyph: GLYPHS.choose(rng).copied().unwrap_or('*'),
            })
            .collect();

        Self { particles }
    }
}

/// Score on the bottom row, centered; particles fly up and out from it.
fn canvas(score: u32, bursts: &[Burst]) -> String {
    let mut cells = vec![vec![' '; CANVAS_WIDTH]; CANVAS_HEIGHT];
    let anchor_x = (CANVAS_WIDTH / 2) as f64;
    let anchor_y = (CANVAS_HEIGHT - 1) as f64;
    let scale_x = anchor_x / START_VELOCITY;
    let scale_y = anchor_y / START_VELOCITY;

    for particle in bursts.iter().flat_map(|burst| &burst.particles) {
        let radians = particle.angle.to_radians();
        let x = (anchor_x + radians.cos() * particle.velocity * scale_x).round();
        let y = (anchor_y - radians.sin() * particle.velocity * scale_y).round();
        if (0.0..CANVAS_WIDTH as f64).contains(&x) && (0.0..anchor_y).contains(&y) {
            cells[y as usize][x as usize] = particle.glyph;
        }
    }

    let score = score.to_string();
    let start = (CANVAS_WIDTH.saturating_sub(score.len())) / 2;
    for (offset, digit) in score.chars().enumerate() {
        if let Some(cell) = cells[CANVAS_HEIGHT - 1].get_mut(start + offset) {
            *cell = digit;
        }
    }

    cells
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_score(score: u32, bursts: &[Burst]) -> String {
    format!(
        "<b>Parabéns!</b>\nSua pontuação final foi:\n<pre>{}</pre>",
        canvas(score, bursts)
    )
}

async fn show(bot: &Bot, chat: ChatId, message: MessageId, text: String) {
    if let Err(e) = bot
        .edit_message_text(chat, message, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!("Failed to render the result in chat {}: {}", chat, e);
    }
}

/// Drives the result message: count-up edits throttled to `render_interval`, then the
/// bursts, then the plain score again.
#[instrument(level = "debug", skip(bot))]
pub(crate) async fn present(
    bot: Bot,
    chat: ChatId,
    message: MessageId,
    score: u32,
    render_interval: Duration,
) {
    let mut frames = interval(COUNT_UP_STEP);
    let mut last_render: Option<Instant> = None;

    for value in CountUp::new(score) {
        frames.tick().await;
        let due = last_render.map_or(true, |at| at.elapsed() >= render_interval);
        if due || value == score {
            show(&bot, chat, message, render_score(value, &[])).await;
            last_render = Some(Instant::now());
        }
    }

    let start = Instant::now();
    let mut bursts = Vec::new();
    for offset in burst_schedule() {
        sleep_until(start + offset).await;
        bursts.push(Burst::scatter(&mut rand::thread_rng()));
        show(&bot, chat, message, render_score(score, &bursts)).await;
    }

    sleep_until(start + BURST_DURATION).await;
    show(&bot, chat, message, render_score(score, &[])).await;
    debug!("Result presented in chat {}", chat);
}
