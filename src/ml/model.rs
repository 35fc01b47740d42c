use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, log_softmax},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        Encoder { token_embedding, position_embedding, layers, final_norm, dropout }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `mask_pad` is true at padding positions; they are never attended to.
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(mask_pad);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// The part of the network that is reused across runs as a
/// pretrained starting point.
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> Encoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] → [batch, seq_len, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mask_pad = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        self.final_norm.forward(x)
    }
}

#[derive(Config, Debug)]
pub struct TokenClassifierConfig {
    pub encoder:    EncoderConfig,
    pub num_labels: usize,
}

impl TokenClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TokenClassifier<B> {
        TokenClassifier {
            encoder:    self.encoder.init(device),
            dropout:    DropoutConfig::new(self.encoder.dropout).init(),
            classifier: LinearConfig::new(self.encoder.d_model, self.num_labels).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct TokenClassifier<B: Backend> {
    pub encoder:    Encoder<B>,
    pub dropout:    Dropout,
    pub classifier: Linear<B>,
}

impl<B: Backend> TokenClassifier<B> {
    /// → logits [batch, seq_len, num_labels]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let hidden = self.encoder.forward(input_ids, attention_mask);
        self.classifier.forward(self.dropout.forward(hidden))
    }

    /// Mean cross-entropy over the positions where `loss_mask` is 1.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        label_ids:      Tensor<B, 2, Int>,
        loss_mask:      Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(input_ids, attention_mask);
        let loss   = masked_cross_entropy(logits.clone(), label_ids, loss_mask);
        (loss, logits)
    }
}

/// Cross-entropy of `logits` [batch, seq, classes] against
/// `targets` [batch, seq], averaged over positions with mask 1.
/// Masked positions still need a valid class id in `targets`.
pub fn masked_cross_entropy<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    mask:    Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 2);
    let picked    = log_probs
        .gather(2, targets.unsqueeze_dim::<3>(2))
        .squeeze::<2>(2); // [batch, seq]

    let mask  = mask.float();
    let count = mask.clone().sum().clamp_min(1.0);
    (picked * mask).sum().neg() / count
}

/// Number of masked positions where argmax(logits) equals the target.
pub fn masked_correct<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    mask:    Tensor<B, 2, Int>,
) -> (usize, usize) {
    let pred    = logits.argmax(2).squeeze::<2>(2);
    let hits    = pred.equal(targets).int() * mask.clone();
    let correct = hits.sum().into_scalar().elem::<i64>();
    let total   = mask.sum().into_scalar().elem::<i64>();
    (correct as usize, total as usize)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn ints(v: &[i32], shape: [usize; 2]) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints(v, &Default::default()).reshape(shape)
    }

    fn tiny_config(num_labels: usize) -> TokenClassifierConfig {
        TokenClassifierConfig::new(EncoderConfig::new(12, 8, 16, 2, 2, 32), num_labels)
    }

    #[test]
    fn test_logits_shape() {
        let model  = tiny_config(5).init::<B>(&Default::default());
        let ids    = ints(&[2, 4, 5, 3, 0, 0, 2, 6, 3, 0, 0, 0], [2, 6]);
        let mask   = ints(&[1, 1, 1, 1, 0, 0, 1, 1, 1, 0, 0, 0], [2, 6]);
        assert_eq!(model.forward(ids, mask).dims(), [2, 6, 5]);
    }

    #[test]
    fn test_masked_cross_entropy_ignores_masked_positions() {
        let device = Default::default();
        // Position 0: confident and right. Position 1: confident and wrong, but masked.
        let logits = Tensor::<B, 1>::from_floats([10.0, 0.0, 0.0, 10.0], &device).reshape([1, 2, 2]);
        let targets = ints(&[0, 0], [1, 2]);

        let only_first = masked_cross_entropy(logits.clone(), targets.clone(), ints(&[1, 0], [1, 2]))
            .into_scalar().elem::<f64>();
        let both = masked_cross_entropy(logits, targets, ints(&[1, 1], [1, 2]))
            .into_scalar().elem::<f64>();

        assert!(only_first < 1e-3, "loss was {only_first}");
        assert!(both > 4.0, "loss was {both}");
    }

    #[test]
    fn test_masked_cross_entropy_all_masked_is_zero() {
        let logits = Tensor::<B, 3>::zeros([1, 3, 4], &Default::default());
        let loss   = masked_cross_entropy(logits, ints(&[0, 0, 0], [1, 3]), ints(&[0, 0, 0], [1, 3]));
        assert_eq!(loss.into_scalar().elem::<f64>(), 0.0);
    }

    #[test]
    fn test_masked_correct_counts() {
        let logits  = Tensor::<B, 1>::from_floats([1.0, 0.0, 0.0, 1.0, 1.0, 0.0], &Default::default())
            .reshape([1, 3, 2]);
        // argmax = [0, 1, 0]
        let (hit, total) = masked_correct(logits, ints(&[0, 0, 0], [1, 3]), ints(&[1, 1, 0], [1, 3]));
        assert_eq!((hit, total), (1, 2));
    }
}
