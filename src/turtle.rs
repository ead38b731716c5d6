//! Turtle state and the interpreter that traces a symbol stream into road segments.
//!
//! The turtle starts at the origin heading along +x. Each symbol is looked up in the
//! interpreter's operation map; symbols with no registered operation are ignored, so
//! grammars may carry bookkeeping symbols (such as `X`) that only drive rewriting.

use crate::error::ConfigError;
use crate::grammar::{GrammarConfig, SymbolStream};
use crate::math::{normalize_angle, unit_vector, Point2d, Vector2d};
use cgmath::MetricSpace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

/// A straight road segment traced by the turtle, before endpoints are merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    /// The segment's index in emission order.
    pub id: usize,
    /// The turtle position before the move.
    pub start: Point2d,
    /// The turtle position after the move.
    pub end: Point2d,
    /// The turtle heading when the segment was drawn, in radians.
    pub heading: f64,
    /// The style class in effect when the segment was drawn.
    pub style_class: String,
}

impl RoadSegment {
    /// The straight-line length of the segment in m.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// The state of the road-drawing turtle.
#[derive(Clone, Debug, PartialEq)]
pub struct TurtleState {
    /// Current position of the cursor.
    pub position: Point2d,
    /// Current heading in radians, counter-clockwise from +x.
    pub heading: f64,
    /// The style class given to segments drawn from here.
    pub style_class: String,
}

impl TurtleState {
    /// Creates a turtle at the origin heading along +x.
    pub fn new(style_class: impl Into<String>) -> Self {
        Self {
            position: Point2d::new(0.0, 0.0),
            heading: 0.0,
            style_class: style_class.into(),
        }
    }

    /// Returns the unit vector the turtle is facing.
    pub fn forward(&self) -> Vector2d {
        unit_vector(self.heading)
    }

    /// Rotates the turtle counter-clockwise by `angle` radians.
    pub fn turn(&mut self, angle: f64) {
        self.heading = normalize_angle(self.heading + angle);
    }
}

/// Operations that can be performed by the road turtle.
#[derive(Clone, Debug, PartialEq)]
pub enum TurtleOp {
    /// Move forward one step, emitting a segment (`F`, `G`).
    Draw,
    /// Move forward one step without emitting a segment (`f`).
    Move,
    /// Turn by the configured angle times the factor; positive is left (`+`/`-`).
    Turn(f64),
    /// Turn 180 degrees (`|`).
    TurnAround,
    /// Save position, heading and style onto the stack (`[`).
    Push,
    /// Restore the most recently pushed state (`]`).
    Pop,
    /// Set the style class of subsequent segments.
    SetStyle(String),
    /// No-op; the symbol has no registered meaning.
    Ignore,
}

/// Interprets symbol streams into road segments.
#[derive(Clone, Debug)]
pub struct Interpreter {
    op_map: HashMap<char, TurtleOp>,
    turn_angle: f64,
    step_length: f64,
    default_style: String,
    max_stack_depth: usize,
}

impl Interpreter {
    /// Creates an interpreter with the standard symbols and the configuration's
    /// style symbols registered.
    pub fn new(config: &GrammarConfig) -> Result<Self, ConfigError> {
        config.validate_turtle()?;
        let mut interpreter = Self {
            op_map: HashMap::new(),
            turn_angle: config.turn_angle().to_radians(),
            step_length: config.step_length(),
            default_style: config.default_style().to_owned(),
            max_stack_depth: config.max_stack_depth(),
        };
        interpreter.populate_standard_symbols();
        for (&symbol, style_class) in config.style_symbols() {
            interpreter.set_op(symbol, TurtleOp::SetStyle(style_class.clone()));
        }
        Ok(interpreter)
    }

    /// Assigns an operation to a symbol, replacing any previous mapping.
    pub fn set_op(&mut self, symbol: char, op: TurtleOp) {
        self.op_map.insert(symbol, op);
    }

    /// Assigns an operation to a symbol (builder pattern).
    pub fn with_op(mut self, symbol: char, op: TurtleOp) -> Self {
        self.set_op(symbol, op);
        self
    }

    /// Registers the conventional turtle symbols.
    fn populate_standard_symbols(&mut self) {
        let mappings = [
            ('F', TurtleOp::Draw),
            ('G', TurtleOp::Draw),
            ('f', TurtleOp::Move),
            ('+', TurtleOp::Turn(1.0)),
            ('-', TurtleOp::Turn(-1.0)),
            ('|', TurtleOp::TurnAround),
            ('[', TurtleOp::Push),
            (']', TurtleOp::Pop),
        ];
        for (symbol, op) in mappings {
            self.set_op(symbol, op);
        }
    }

    /// Walks the symbol stream and returns the segments drawn, in emission order.
    ///
    /// A pop with nothing on the stack does nothing. Pushes beyond the maximum
    /// stack depth are dropped together with their matching pops.
    pub fn interpret(&self, symbols: &SymbolStream) -> Vec<RoadSegment> {
        let mut turtle = TurtleState::new(self.default_style.clone());
        let mut stack: Vec<TurtleState> = Vec::new();
        let mut overflow = 0usize;
        let mut unmatched_pops = 0usize;
        let mut segments = Vec::new();

        for symbol in symbols.symbols() {
            let op = self.op_map.get(&symbol).unwrap_or(&TurtleOp::Ignore);
            match op {
                TurtleOp::Draw => {
                    let start = turtle.position;
                    turtle.position += turtle.forward() * self.step_length;
                    segments.push(RoadSegment {
                        id: segments.len(),
                        start,
                        end: turtle.position,
                        heading: turtle.heading,
                        style_class: turtle.style_class.clone(),
                    });
                }
                TurtleOp::Move => turtle.position += turtle.forward() * self.step_length,
                TurtleOp::Turn(factor) => turtle.turn(self.turn_angle * factor),
                TurtleOp::TurnAround => turtle.turn(PI),
                TurtleOp::SetStyle(style_class) => turtle.style_class = style_class.clone(),
                TurtleOp::Push => {
                    if stack.len() < self.max_stack_depth {
                        stack.push(turtle.clone());
                    } else {
                        overflow += 1;
                    }
                }
                TurtleOp::Pop => {
                    if overflow > 0 {
                        overflow -= 1;
                    } else if let Some(state) = stack.pop() {
                        turtle = state;
                    } else {
                        unmatched_pops += 1;
                    }
                }
                TurtleOp::Ignore => {}
            }
        }

        if unmatched_pops > 0 {
            log::debug!("ignored {} pops on an empty turtle stack", unmatched_pops);
        }
        log::debug!(
            "turtle traced {} segments from {} symbols",
            segments.len(),
            symbols.len()
        );
        segments
    }
}

/// Interprets a symbol stream using the configuration's turn angle and step length.
pub fn interpret(
    symbols: &SymbolStream,
    config: &GrammarConfig,
) -> Result<Vec<RoadSegment>, ConfigError> {
    Ok(Interpreter::new(config)?.interpret(symbols))
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn config() -> GrammarConfig {
        GrammarConfig::new("F")
            .with_rule('F', "F")
            .with_turn_angle(90.0)
            .with_step_length(10.0)
    }

    fn run(symbols: &str) -> Vec<RoadSegment> {
        interpret(&symbols.into(), &config()).unwrap()
    }

    #[test]
    fn draw_emits_segments_in_order() {
        let segments = run("FF+F");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments.iter().map(|s| s.id).collect::<Vec<_>>(), [0, 1, 2]);
        assert_approx_eq!(segments[1].start.x, 10.0);
        assert_approx_eq!(segments[1].end.x, 20.0);
        assert_approx_eq!(segments[2].end.x, 20.0);
        assert_approx_eq!(segments[2].end.y, 10.0);
        assert_approx_eq!(segments[2].heading, std::f64::consts::FRAC_PI_2);
        for segment in &segments {
            assert_approx_eq!(segment.length(), 10.0);
        }
    }

    #[test]
    fn square_closes_on_itself() {
        let segments = run("F+F+F+F");
        assert_eq!(segments.len(), 4);
        let last = segments.last().unwrap();
        assert_approx_eq!(last.end.x, 0.0);
        assert_approx_eq!(last.end.y, 0.0);
    }

    #[test]
    fn branches_return_to_the_saved_state() {
        let segments = run("[F]+[F]-F");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].start, Point2d::new(0.0, 0.0));
        assert_approx_eq!(segments[1].end.y, 10.0);
        assert_approx_eq!(segments[2].end.x, 10.0);
        assert_approx_eq!(segments[2].heading, 0.0);
    }

    #[test]
    fn move_and_unknown_symbols_do_not_draw() {
        let segments = run("XfYF|F");
        assert_eq!(segments.len(), 2);
        assert_approx_eq!(segments[0].start.x, 10.0);
        assert_approx_eq!(segments[1].start.x, 20.0);
        assert_approx_eq!(segments[1].end.x, 10.0);
    }

    #[test]
    fn unmatched_pops_are_ignored() {
        let segments = run("]]F]F[F]]]F");
        assert_eq!(segments.len(), 4);
        assert_approx_eq!(segments[3].start.x, 20.0);
        assert_approx_eq!(segments[3].end.x, 30.0);
    }

    #[test]
    fn styles_follow_the_stack() {
        let config = config()
            .with_default_style("avenue")
            .with_style_symbol('H', "highway");
        let segments = interpret(&"F[HF]F".into(), &config).unwrap();
        let styles = segments.iter().map(|s| s.style_class.as_str()).collect::<Vec<_>>();
        assert_eq!(styles, ["avenue", "highway", "avenue"]);
    }

    #[test]
    fn overflowing_pushes_drop_their_pops() {
        let config = config().with_max_stack_depth(1);
        // The inner push is dropped, so its pop must not unwind the outer branch
        let segments = interpret(&"[F[F]F]F".into(), &config).unwrap();
        assert_eq!(segments.len(), 4);
        assert_approx_eq!(segments[2].start.x, 20.0);
        assert_approx_eq!(segments[3].start.x, 0.0);
    }

    #[test]
    fn custom_ops_override_standard_symbols() {
        let interpreter = Interpreter::new(&config())
            .unwrap()
            .with_op('F', TurtleOp::Move)
            .with_op('D', TurtleOp::Draw);
        let segments = interpreter.interpret(&"FD".into());
        assert_eq!(segments.len(), 1);
        assert_approx_eq!(segments[0].start.x, 10.0);
    }

    #[test]
    fn interpretation_is_deterministic() {
        let symbols: SymbolStream = "F[+F[-F]F]F[-F+F]FF".into();
        let config = config().with_turn_angle(27.5);
        assert_eq!(
            interpret(&symbols, &config).unwrap(),
            interpret(&symbols, &config).unwrap()
        );
    }

    #[test]
    fn invalid_step_length_is_rejected() {
        let config = config().with_step_length(-1.0);
        assert_eq!(
            interpret(&"F".into(), &config),
            Err(ConfigError::InvalidStepLength(-1.0))
        );
    }
}
