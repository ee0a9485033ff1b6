// ============================================================
// Layer 5 — Structured Self-Attention Classifier
// ============================================================
// Embedding → stacked BiLSTM → multi-hop attention → fc → pred
//
//   inputs   [batch, seq_len]               token ids
//   H        [batch, seq_len, 2*hidden]     BiLSTM outputs
//   A        [batch, seq_len, hops]         softmax over seq_len, per hop
//   M        [batch, 2*hidden, hops]        Hᵗ·A, attention-pooled sentence matrix
//   logits   [batch, nb_classes]
//
// Only the embedding table is explicitly initialised (standard
// normal). The BiLSTM and linear layers keep Burn's defaults.
//
// Reference: Lin et al. (2017) A Structured Self-attentive
//            Sentence Embedding

use burn::{
    nn::{
        BiLstm, BiLstmConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Initializer,
        Linear, LinearConfig,
        LstmState,
        Relu,
    },
    prelude::*,
    tensor::activation::softmax,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SelfAttentionConfig {
    pub vocab_size:    usize,
    pub embedding_dim: usize,
    pub hidden_dim:    usize,
    /// Stacked BiLSTM layers
    pub nb_layers:     usize,
    /// Width of the first attention projection
    pub da:            usize,
    /// Number of attention hops (rows of M)
    pub nb_hops:       usize,
    pub fc_ch:         usize,
    pub nb_classes:    usize,
    #[config(default = 0.5)]
    pub dropout:       f64,
    /// Scale applied to the attention redundancy penalty
    #[config(default = 1.0)]
    pub coef:          f64,
    /// Add the penalty to the cross-entropy loss
    #[config(default = true)]
    pub penalize:      bool,
}

impl SelfAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SelfAttentionClassifier<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim)
            .with_initializer(Initializer::Normal { mean: 0.0, std: 1.0 })
            .init(device);

        let encoder = (0..self.nb_layers)
            .map(|layer| {
                let d_input = if layer == 0 { self.embedding_dim } else { 2 * self.hidden_dim };
                BiLstmConfig::new(d_input, self.hidden_dim, true).init(device)
            })
            .collect();

        let ws1 = LinearConfig::new(2 * self.hidden_dim, self.da)
            .with_bias(false)
            .init(device);
        let ws2 = LinearConfig::new(self.da, self.nb_hops)
            .with_bias(false)
            .init(device);

        let fc   = LinearConfig::new(self.pooled_dim(), self.fc_ch).init(device);
        let pred = LinearConfig::new(self.fc_ch, self.nb_classes).init(device);

        SelfAttentionClassifier {
            embedding, encoder, ws1, ws2, fc, pred,
            relu:       Relu::new(),
            dropout:    DropoutConfig::new(self.dropout).init(),
            hidden_dim: self.hidden_dim,
            nb_layers:  self.nb_layers,
        }
    }

    /// Width of the flattened sentence matrix fed to `fc`
    pub fn pooled_dim(&self) -> usize {
        self.nb_hops * 2 * self.hidden_dim
    }
}

#[derive(Module, Debug)]
pub struct SelfAttentionClassifier<B: Backend> {
    embedding:  Embedding<B>,
    encoder:    Vec<BiLstm<B>>,
    ws1:        Linear<B>,
    ws2:        Linear<B>,
    fc:         Linear<B>,
    pred:       Linear<B>,
    relu:       Relu,
    dropout:    Dropout,
    hidden_dim: usize,
    nb_layers:  usize,
}

pub struct ClassifierOutput<B: Backend> {
    /// Unnormalised class scores: [batch, nb_classes]
    pub logits:    Tensor<B, 2>,
    /// Attention weights: [batch, seq_len, nb_hops]
    pub attention: Tensor<B, 3>,
    /// Final BiLSTM state, same shape as the state passed in
    pub state:     LstmState<B, 3>,
}

impl<B: Backend> SelfAttentionClassifier<B> {
    /// Zero (hidden, cell) pair of shape [2 * nb_layers, batch_size, hidden_dim]
    /// on the device holding the model weights.
    pub fn init_hidden(&self, batch_size: usize) -> LstmState<B, 3> {
        let device = self.embedding.weight.val().device();
        let shape  = [2 * self.nb_layers, batch_size, self.hidden_dim];
        LstmState {
            cell:   Tensor::zeros(shape, &device),
            hidden: Tensor::zeros(shape, &device),
        }
    }

    pub fn forward(&self, inputs: Tensor<B, 2, Int>, state: LstmState<B, 3>) -> ClassifierOutput<B> {
        self.forward_traced(inputs, state, false)
    }

    /// Same pass as [`forward`](Self::forward); with `trace_shapes` set, each
    /// stage's output shape is emitted as a `debug` event.
    pub fn forward_traced(
        &self,
        inputs:       Tensor<B, 2, Int>,
        state:        LstmState<B, 3>,
        trace_shapes: bool,
    ) -> ClassifierOutput<B> {
        trace_shape(trace_shapes, "inputs", &inputs.dims());

        let embedded = self.embedding.forward(inputs);
        trace_shape(trace_shapes, "embedded", &embedded.dims());

        let (h, state) = self.encode(embedded, state);
        trace_shape(trace_shapes, "lstm", &h.dims());

        let projected = self.ws1.forward(h.clone()).tanh();
        trace_shape(trace_shapes, "ws1", &projected.dims());

        let scores = self.ws2.forward(projected);
        trace_shape(trace_shapes, "ws2", &scores.dims());

        // Each hop is normalised over the sequence axis independently
        // for every batch element.
        let attention = softmax(scores, 1);
        trace_shape(trace_shapes, "attention", &attention.dims());

        let flat = pool(h, attention.clone());
        trace_shape(trace_shapes, "pooled", &flat.dims());

        let fc_out = self.relu.forward(self.fc.forward(flat));
        trace_shape(trace_shapes, "fc", &fc_out.dims());

        let logits = self.pred.forward(self.dropout.forward(fc_out));
        trace_shape(trace_shapes, "pred", &logits.dims());

        ClassifierOutput { logits, attention, state }
    }

    /// Runs the stacked BiLSTM. Layer `l` owns rows `2l..2l+2` of the
    /// state tensors, forward direction first.
    fn encode(&self, embedded: Tensor<B, 3>, state: LstmState<B, 3>) -> (Tensor<B, 3>, LstmState<B, 3>) {
        let [_, batch_size, hidden_dim] = state.hidden.dims();
        let mut x      = embedded;
        let mut hidden = Vec::with_capacity(self.encoder.len());
        let mut cell   = Vec::with_capacity(self.encoder.len());

        for (layer, lstm) in self.encoder.iter().enumerate() {
            let rows = 2 * layer..2 * layer + 2;
            let layer_state = LstmState {
                cell:   state.cell.clone().slice([rows.clone(), 0..batch_size, 0..hidden_dim]),
                hidden: state.hidden.clone().slice([rows, 0..batch_size, 0..hidden_dim]),
            };
            let (output, next) = lstm.forward(x, Some(layer_state));
            x = output;
            hidden.push(next.hidden);
            cell.push(next.cell);
        }

        let state = LstmState {
            cell:   Tensor::cat(cell, 0),
            hidden: Tensor::cat(hidden, 0),
        };
        (x, state)
    }
}

/// M = Hᵗ·A, flattened row-major to [batch, 2*hidden * hops]: the hidden
/// unit is the outer index of the `fc` input, the hop the inner one.
fn pool<B: Backend>(h: Tensor<B, 3>, attention: Tensor<B, 3>) -> Tensor<B, 2> {
    let pooled = h.swap_dims(1, 2).matmul(attention);
    let [batch_size, width, hops] = pooled.dims();
    pooled.reshape([batch_size, width * hops])
}

fn trace_shape(enabled: bool, stage: &'static str, dims: &[usize]) {
    if enabled {
        tracing::debug!(stage, ?dims, "forward shape");
    }
}
