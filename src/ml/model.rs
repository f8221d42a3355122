// ============================================================
// Layer 5 — Morph Model
// ============================================================
// Character-level encoder/decoder with six classification heads.
//
//   words[k] ──embed──► mean‖max ──word_proj──┐
//   (anchor, left×cw, right×cw)               ├─► context_proj ─► context [B,H]
//                                             ┘        │
//   anchor chars ──embed──► encoder_in (+context) ──self-attn──► enc [B,L,H]
//                                                        │
//   decoder_input ──embed──► decoder_in ──cross-attn(enc)──► dec [B,L,H]
//                                                        │
//   dec ‖ context ──root_hidden──tanh──root_head──► root_logits [B,L,V]
//   context ‖ phonetic[i] ──feature_heads[i]──► feature_logits[i] [B,C_i]
//
// The decoder reads only its own input position plus the encoder, so
// position t of the root never sees decoder_input[t+1..]. Greedy
// decoding can therefore re-run the full forward pass per step.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, tanh},
};

use crate::data::vocabulary::PAD_INDEX;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct MorphModelConfig {
    /// Root output width: vocabulary size + 2.
    pub vocab_width:     usize,
    /// Upper bound on the padded word width.
    pub max_positions:   usize,
    pub embed_dim:       usize,
    pub hidden_dim:      usize,
    pub num_heads:       usize,
    pub context_window:  usize,
    /// Class count per tag position.
    pub feature_classes: Vec<usize>,
    /// Phonetic column width per tag position, empty without phonetic input.
    pub phonetic_dims:   Vec<usize>,
    pub dropout:         f64,
}

impl MorphModelConfig {
    pub fn word_columns(&self) -> usize {
        1 + 2 * self.context_window
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> MorphModel<B> {
        let e = self.embed_dim;
        let h = self.hidden_dim;

        let char_embedding     = EmbeddingConfig::new(self.vocab_width, e).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_positions, e).init(device);
        let word_proj          = LinearConfig::new(2 * e, h).init(device);
        let context_proj       = LinearConfig::new(self.word_columns() * h, h).init(device);

        let encoder_in   = LinearConfig::new(e, h).init(device);
        let encoder_attn = MultiHeadAttentionConfig::new(h, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let encoder_norm = LayerNormConfig::new(h).init(device);

        let decoder_in   = LinearConfig::new(e, h).init(device);
        let cross_attn   = MultiHeadAttentionConfig::new(h, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let decoder_norm = LayerNormConfig::new(h).init(device);

        let root_hidden = LinearConfig::new(2 * h, h).init(device);
        let root_head   = LinearConfig::new(h, self.vocab_width).init(device);

        let feature_heads = self
            .feature_classes
            .iter()
            .enumerate()
            .map(|(i, &classes)| {
                let extra = self.phonetic_dims.get(i).copied().unwrap_or(0);
                LinearConfig::new(h + extra, classes).init(device)
            })
            .collect();

        MorphModel {
            char_embedding, position_embedding, word_proj, context_proj,
            encoder_in, encoder_attn, encoder_norm,
            decoder_in, cross_attn, decoder_norm,
            root_hidden, root_head, feature_heads,
            dropout: DropoutConfig::new(self.dropout).init(),
            max_positions: self.max_positions,
        }
    }
}

#[derive(Module, Debug)]
pub struct MorphModel<B: Backend> {
    pub char_embedding:     Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub word_proj:          Linear<B>,
    pub context_proj:       Linear<B>,
    pub encoder_in:         Linear<B>,
    pub encoder_attn:       MultiHeadAttention<B>,
    pub encoder_norm:       LayerNorm<B>,
    pub decoder_in:         Linear<B>,
    pub cross_attn:         MultiHeadAttention<B>,
    pub decoder_norm:       LayerNorm<B>,
    pub root_hidden:        Linear<B>,
    pub root_head:          Linear<B>,
    pub feature_heads:      Vec<Linear<B>>,
    pub dropout:            Dropout,
    pub max_positions:      usize,
}

pub struct MorphOutput<B: Backend> {
    /// [batch, width, vocab_width]
    pub root_logits:    Tensor<B, 3>,
    /// One [batch, class_count_i] tensor per tag position.
    pub feature_logits: Vec<Tensor<B, 2>>,
}

impl<B: Backend> MorphModel<B> {
    pub fn max_positions(&self) -> usize {
        self.max_positions
    }

    /// Character + position embedding: [batch, width] → [batch, width, embed]
    ///
    /// Positions past the trained range share the last position vector,
    /// so any width is accepted.
    fn embed(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, width] = ids.dims();
        let chars = self.char_embedding.forward(ids);
        let last = self.max_positions.saturating_sub(1) as i64;
        let positions = Tensor::<B, 1, Int>::arange(0..width as i64, &chars.device())
            .clamp_max(last)
            .unsqueeze::<2>()
            .expand([batch_size, width]);
        chars + self.position_embedding.forward(positions)
    }

    /// Mean and max over characters, projected to one vector per word.
    fn summarize(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, _] = ids.dims();
        let x = self.embed(ids);
        let [_, _, embed] = x.dims();
        let pooled = Tensor::cat(vec![x.clone().mean_dim(1), x.max_dim(1)], 2)
            .reshape([batch_size, 2 * embed]);
        relu(self.word_proj.forward(pooled))
    }

    /// words: anchor, left×cw, right×cw, each [batch, width]
    /// decoder_input: [batch, width]
    /// phonetic: empty, or one [batch, dim_i] tensor per tag position
    pub fn forward(
        &self,
        words:         Vec<Tensor<B, 2, Int>>,
        decoder_input: Tensor<B, 2, Int>,
        phonetic:      Vec<Tensor<B, 2>>,
    ) -> MorphOutput<B> {
        let anchor = words[0].clone();
        let [batch_size, width] = anchor.dims();

        // ── Step 1: sentence context vector ──
        let summaries: Vec<Tensor<B, 2>> = words.into_iter().map(|w| self.summarize(w)).collect();
        let context = self.dropout.forward(relu(
            self.context_proj.forward(Tensor::cat(summaries, 1)),
        ));
        let [_, hidden] = context.dims();
        let context_seq = context
            .clone()
            .unsqueeze_dim::<3>(1)
            .expand([batch_size, width, hidden]);

        // ── Step 2: encoder over the anchor characters ──
        let x = self.encoder_in.forward(self.embed(anchor)) + context_seq.clone();
        let attn = self.encoder_attn.forward(MhaInput::self_attn(x.clone())).context;
        let encoded = self.encoder_norm.forward(x + self.dropout.forward(attn));

        // ── Step 3: decoder attends to the encoder per output position ──
        let d = self.decoder_in.forward(self.embed(decoder_input));
        let cross = self
            .cross_attn
            .forward(MhaInput::new(d.clone(), encoded.clone(), encoded))
            .context;
        let decoded = self.decoder_norm.forward(d + self.dropout.forward(cross));

        let root_state = tanh(self.root_hidden.forward(Tensor::cat(vec![decoded, context_seq], 2)));
        let root_logits = self.root_head.forward(self.dropout.forward(root_state));

        // ── Step 4: tag heads ──
        let feature_logits = self
            .feature_heads
            .iter()
            .enumerate()
            .map(|(i, head)| match phonetic.get(i) {
                Some(p) => head.forward(Tensor::cat(vec![context.clone(), p.clone()], 1)),
                None => head.forward(context.clone()),
            })
            .collect();

        MorphOutput { root_logits, feature_logits }
    }
}

/// Summed cross-entropy: root characters (padding ignored) + every tag head.
pub fn morph_loss<B: Backend>(
    output:          &MorphOutput<B>,
    root_targets:    Tensor<B, 2, Int>,
    feature_targets: &[Tensor<B, 1, Int>],
) -> Tensor<B, 1> {
    let [batch_size, width, vocab_width] = output.root_logits.dims();
    let device = output.root_logits.device();

    let root_ce = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![PAD_INDEX as usize]))
        .init(&device);
    let mut loss = root_ce.forward(
        output.root_logits.clone().reshape([batch_size * width, vocab_width]),
        root_targets.reshape([batch_size * width]),
    );

    let ce = CrossEntropyLossConfig::new().init(&device);
    for (logits, targets) in output.feature_logits.iter().zip(feature_targets) {
        loss = loss + ce.forward(logits.clone(), targets.clone());
    }
    loss
}
