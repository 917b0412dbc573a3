//! Small fully connected regressor with manual backpropagation
//!
//! ReLU hidden layers, linear output, MSE loss and the Adam optimizer.
//! Inputs and targets are standardized internally, so callers work in raw
//! units on both sides.

use serde::{Deserialize, Serialize};

use super::random::RandomSource;
use super::EstimationError;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;
const MIN_STD: f64 = 1e-8;

/// Hyperparameters for one call to [`Regressor::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of samples held out for validation
    pub validation_split: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.005,
            validation_split: 0.2,
        }
    }
}

/// Loss and mean absolute error in raw target units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub mae: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub training_samples: usize,
    pub validation_samples: usize,
    /// Standardized MSE over the final epoch
    pub final_training_loss: f64,
    /// Held-out evaluation, absent when nothing was held out
    pub validation: Option<Evaluation>,
}

/// Per-column zero-mean unit-variance scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl Standardizer {
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            std: vec![1.0; width],
        }
    }

    pub fn fit<R: AsRef<[f64]>>(rows: &[R], width: usize) -> Self {
        let mut scaler = Self::identity(width);
        if rows.is_empty() {
            return scaler;
        }
        let n = rows.len() as f64;
        for row in rows {
            for (mean, value) in scaler.mean.iter_mut().zip(row.as_ref()) {
                *mean += value / n;
            }
        }
        for (i, std) in scaler.std.iter_mut().enumerate() {
            let variance = rows
                .iter()
                .map(|row| (row.as_ref()[i] - scaler.mean[i]).powi(2))
                .sum::<f64>()
                / n;
            *std = variance.sqrt().max(MIN_STD);
        }
        scaler
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }

    pub fn inverse(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(value, (mean, std))| value * std + mean)
            .collect()
    }
}

/// Fully connected layer, weights stored row-major `[output][input]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    inputs: usize,
    outputs: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Dense {
    /// He-uniform initialization, zero biases
    pub fn new(inputs: usize, outputs: usize, rng: &mut dyn RandomSource) -> Self {
        let limit = (6.0 / inputs.max(1) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.uniform(-limit, limit))
            .collect();
        Self {
            inputs,
            outputs,
            weights,
            biases: vec![0.0; outputs],
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        (0..self.outputs)
            .map(|o| {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + self.biases[o]
            })
            .collect()
    }
}

/// Adam state, one moment pair per parameter group
#[derive(Debug, Clone)]
struct Adam {
    learning_rate: f64,
    step: u64,
    m: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
}

impl Adam {
    fn new(learning_rate: f64, group_sizes: &[usize]) -> Self {
        Self {
            learning_rate,
            step: 0,
            m: group_sizes.iter().map(|&n| vec![0.0; n]).collect(),
            v: group_sizes.iter().map(|&n| vec![0.0; n]).collect(),
        }
    }

    /// Advance the step counter and return the bias-corrected rate
    fn begin_step(&mut self) -> f64 {
        self.step += 1;
        let t = self.step as f64;
        self.learning_rate * (1.0 - ADAM_BETA2.powf(t)).sqrt() / (1.0 - ADAM_BETA1.powf(t))
    }

    fn update(&mut self, group: usize, params: &mut [f64], grads: &[f64], rate: f64) {
        let (m, v) = (&mut self.m[group], &mut self.v[group]);
        for i in 0..params.len() {
            let g = grads[i];
            m[i] = ADAM_BETA1 * m[i] + (1.0 - ADAM_BETA1) * g;
            v[i] = ADAM_BETA2 * v[i] + (1.0 - ADAM_BETA2) * g * g;
            params[i] -= rate * m[i] / (v[i].sqrt() + ADAM_EPSILON);
        }
    }
}

struct Gradients {
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
}

impl Gradients {
    fn zeros(layers: &[Dense]) -> Self {
        Self {
            weights: layers.iter().map(|l| vec![0.0; l.weights.len()]).collect(),
            biases: layers.iter().map(|l| vec![0.0; l.biases.len()]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regressor {
    layers: Vec<Dense>,
    input_scaler: Standardizer,
    target_scaler: Standardizer,
}

impl Regressor {
    /// `widths` lists every layer width including input and output, e.g.
    /// `[8, 64, 32, 16, 1]`
    pub fn new(widths: &[usize], rng: &mut dyn RandomSource) -> Result<Self, EstimationError> {
        if widths.len() < 2 || widths.contains(&0) {
            return Err(EstimationError::InvalidInput {
                field: "layers",
                reason: format!("invalid layer widths {widths:?}"),
            });
        }
        let layers = widths
            .windows(2)
            .map(|pair| Dense::new(pair[0], pair[1], rng))
            .collect();
        Ok(Self {
            layers,
            input_scaler: Standardizer::identity(widths[0]),
            target_scaler: Standardizer::identity(widths[widths.len() - 1]),
        })
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map_or(0, |l| l.inputs)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outputs)
    }

    /// Raw-unit prediction for one row
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        let normalized = self.input_scaler.transform(input);
        let output = self.forward(&normalized).pop().unwrap_or_default();
        self.target_scaler.inverse(&output)
    }

    /// MSE and MAE over every output of every row, in raw units
    pub fn evaluate<X, Y>(&self, inputs: &[X], targets: &[Y]) -> Evaluation
    where
        X: AsRef<[f64]>,
        Y: AsRef<[f64]>,
    {
        let mut squared = 0.0;
        let mut absolute = 0.0;
        let mut count = 0usize;
        for (input, target) in inputs.iter().zip(targets) {
            for (p, t) in self.predict(input.as_ref()).iter().zip(target.as_ref()) {
                squared += (p - t).powi(2);
                absolute += (p - t).abs();
                count += 1;
            }
        }
        if count == 0 {
            return Evaluation { loss: 0.0, mae: 0.0 };
        }
        Evaluation {
            loss: squared / count as f64,
            mae: absolute / count as f64,
        }
    }

    pub fn fit<X, Y>(
        &mut self,
        inputs: &[X],
        targets: &[Y],
        config: &TrainingConfig,
        rng: &mut dyn RandomSource,
    ) -> Result<TrainingReport, EstimationError>
    where
        X: AsRef<[f64]>,
        Y: AsRef<[f64]>,
    {
        self.check_shapes(inputs, targets)?;
        if config.batch_size == 0 || !(0.0..1.0).contains(&config.validation_split) {
            return Err(EstimationError::InvalidInput {
                field: "training_config",
                reason: "batch size must be positive and validation split in [0, 1)".to_string(),
            });
        }

        let mut order: Vec<usize> = (0..inputs.len()).collect();
        shuffle(&mut order, rng);
        let held_out = ((inputs.len() as f64 * config.validation_split).round() as usize)
            .min(inputs.len() - 1);
        let (validation, training) = order.split_at(held_out);
        let mut training = training.to_vec();

        let training_inputs: Vec<&[f64]> = training.iter().map(|&i| inputs[i].as_ref()).collect();
        let training_targets: Vec<&[f64]> = training.iter().map(|&i| targets[i].as_ref()).collect();
        self.input_scaler = Standardizer::fit(&training_inputs, self.input_width());
        self.target_scaler = Standardizer::fit(&training_targets, self.output_width());

        let x: Vec<Vec<f64>> = inputs.iter().map(|r| self.input_scaler.transform(r.as_ref())).collect();
        let y: Vec<Vec<f64>> = targets.iter().map(|r| self.target_scaler.transform(r.as_ref())).collect();

        let groups: Vec<usize> = self
            .layers
            .iter()
            .flat_map(|l| [l.weights.len(), l.biases.len()])
            .collect();
        let mut adam = Adam::new(config.learning_rate, &groups);
        let mut final_training_loss = 0.0;

        for _ in 0..config.epochs {
            shuffle(&mut training, rng);
            let mut epoch_loss = 0.0;
            for batch in training.chunks(config.batch_size) {
                let mut grads = Gradients::zeros(&self.layers);
                for &i in batch {
                    epoch_loss += self.backward(&x[i], &y[i], batch.len(), &mut grads);
                }
                let rate = adam.begin_step();
                for (l, layer) in self.layers.iter_mut().enumerate() {
                    adam.update(2 * l, &mut layer.weights, &grads.weights[l], rate);
                    adam.update(2 * l + 1, &mut layer.biases, &grads.biases[l], rate);
                }
            }
            final_training_loss = epoch_loss / training.len() as f64;
        }

        let evaluation = if validation.is_empty() {
            None
        } else {
            let vx: Vec<&[f64]> = validation.iter().map(|&i| inputs[i].as_ref()).collect();
            let vy: Vec<&[f64]> = validation.iter().map(|&i| targets[i].as_ref()).collect();
            Some(self.evaluate(&vx, &vy))
        };

        Ok(TrainingReport {
            epochs: config.epochs,
            training_samples: training.len(),
            validation_samples: validation.len(),
            final_training_loss,
            validation: evaluation,
        })
    }

    fn check_shapes<X, Y>(&self, inputs: &[X], targets: &[Y]) -> Result<(), EstimationError>
    where
        X: AsRef<[f64]>,
        Y: AsRef<[f64]>,
    {
        let invalid = |reason: String| EstimationError::InvalidInput {
            field: "training_set",
            reason,
        };
        if inputs.is_empty() {
            return Err(invalid("no samples".to_string()));
        }
        if inputs.len() != targets.len() {
            return Err(invalid(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.iter().any(|r| r.as_ref().len() != self.input_width())
            || targets.iter().any(|r| r.as_ref().len() != self.output_width())
        {
            return Err(invalid("row width does not match the network".to_string()));
        }
        let finite = |row: &[f64]| row.iter().all(|v| v.is_finite());
        if !inputs.iter().all(|r| finite(r.as_ref())) || !targets.iter().all(|r| finite(r.as_ref())) {
            return Err(invalid("non-finite value".to_string()));
        }
        Ok(())
    }

    /// Activations of every layer, input first
    fn forward(&self, input: &[f64]) -> Vec<Vec<f64>> {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());
        let last = self.layers.len() - 1;
        for (l, layer) in self.layers.iter().enumerate() {
            let mut z = layer.forward(&activations[l]);
            if l != last {
                z.iter_mut().for_each(|v| *v = v.max(0.0));
            }
            activations.push(z);
        }
        activations
    }

    /// Accumulate gradients of the batch-mean MSE for one sample and return
    /// that sample's squared error
    fn backward(&self, x: &[f64], y: &[f64], batch: usize, grads: &mut Gradients) -> f64 {
        let activations = self.forward(x);
        let output = &activations[activations.len() - 1];
        let scale = 2.0 / (batch * y.len()) as f64;

        let loss = output.iter().zip(y).map(|(p, t)| (p - t).powi(2)).sum::<f64>() / y.len() as f64;
        let mut delta: Vec<f64> = output.iter().zip(y).map(|(p, t)| scale * (p - t)).collect();

        for l in (0..self.layers.len()).rev() {
            let layer = &self.layers[l];
            let input = &activations[l];
            for o in 0..layer.outputs {
                grads.biases[l][o] += delta[o];
                let row = &mut grads.weights[l][o * layer.inputs..(o + 1) * layer.inputs];
                for (g, a) in row.iter_mut().zip(input) {
                    *g += delta[o] * a;
                }
            }
            if l == 0 {
                break;
            }
            // ReLU derivative on the previous layer's activation
            delta = (0..layer.inputs)
                .map(|i| {
                    if input[i] <= 0.0 {
                        return 0.0;
                    }
                    (0..layer.outputs)
                        .map(|o| layer.weights[o * layer.inputs + i] * delta[o])
                        .sum::<f64>()
                })
                .collect();
        }
        loss
    }
}

/// Fisher-Yates
fn shuffle(items: &mut [usize], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.index(i + 1);
        items.swap(i, j);
    }
}
