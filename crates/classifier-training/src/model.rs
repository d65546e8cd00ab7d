//! Backbone architectures and classifier assembly.
//!
//! Implements:
//! - ResNet-50, VGG-16, and MobileNet-V2 feature extractors (tops excluded)
//! - The architecture registry (selector -> backbone constructor)
//! - Pre-trained weight loading
//! - TransferClassifier: backbone + flatten + fully-connected head
//! - Model compilation with the configured optimizer and loss

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::{CrossEntropyLoss, CrossEntropyLossConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    optim::{AdamConfig, AdamWConfig, RmsPropConfig, SgdConfig},
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::{activation::softmax, backend::Backend, Tensor},
};
use classifier_core::{
    ArchitectureKind, ImageShape, LossKind, OptimizerKind, Result, TrainerError, TrainingOptions,
};
use std::path::Path;

/// Output dimension after a stride-2 layer with "same"-style padding
fn half_up(n: u32) -> u32 {
    (n + 1) / 2
}

/// Output dimension after 2x2 max-pooling
fn half_down(n: u32) -> u32 {
    n / 2
}

/// Single bottleneck block with projection shortcut
///
/// Every stage here changes its channel count, so the shortcut is always
/// a 1x1 projection.
#[derive(Module, Debug)]
struct Bottleneck<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    conv3: Conv2d<B>,
    bn3: BatchNorm<B, 2>,
    downsample: Conv2d<B>,
    downsample_bn: BatchNorm<B, 2>,
    activation: Relu,
}

impl<B: Backend> Bottleneck<B> {
    fn new(
        in_channels: usize,
        mid_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &B::Device,
    ) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, mid_channels], [1, 1]).init(device);
        let bn1 = BatchNormConfig::new(mid_channels).init(device);

        let conv2 = Conv2dConfig::new([mid_channels, mid_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn2 = BatchNormConfig::new(mid_channels).init(device);

        let conv3 = Conv2dConfig::new([mid_channels, out_channels], [1, 1]).init(device);
        let bn3 = BatchNormConfig::new(out_channels).init(device);

        let downsample = Conv2dConfig::new([in_channels, out_channels], [1, 1])
            .with_stride([stride, stride])
            .init(device);
        let downsample_bn = BatchNormConfig::new(out_channels).init(device);

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            conv3,
            bn3,
            downsample,
            downsample_bn,
            activation: Relu::new(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = self.downsample.forward(input.clone());
        let identity = self.downsample_bn.forward(identity);

        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv3.forward(x);
        let x = self.bn3.forward(x);

        let x = x.add(identity);
        self.activation.forward(x)
    }
}

/// ResNet-50 feature extractor
///
/// Stem conv + max-pooling followed by four bottleneck stages. The
/// classification top is excluded; the output is the final feature map
/// (2048 channels, 1/32 of the input resolution).
#[derive(Module, Debug)]
pub struct ResNet50<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    maxpool: MaxPool2d,
    stage1: Bottleneck<B>,
    stage2: Bottleneck<B>,
    stage3: Bottleneck<B>,
    stage4: Bottleneck<B>,
    activation: Relu,
}

impl<B: Backend> ResNet50<B> {
    const OUT_CHANNELS: usize = 2048;

    /// Create a new ResNet-50 feature extractor
    pub fn new(device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .init(device);
        let bn1 = BatchNormConfig::new(64).init(device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let stage1 = Bottleneck::new(64, 64, 256, 1, device);
        let stage2 = Bottleneck::new(256, 128, 512, 2, device);
        let stage3 = Bottleneck::new(512, 256, 1024, 2, device);
        let stage4 = Bottleneck::new(1024, 512, 2048, 2, device);

        Self {
            conv1,
            bn1,
            maxpool,
            stage1,
            stage2,
            stage3,
            stage4,
            activation: Relu::new(),
        }
    }

    /// Forward pass, producing the final feature map
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.activation.forward(x);
        let x = self.maxpool.forward(x);

        let x = self.stage1.forward(x);
        let x = self.stage2.forward(x);
        let x = self.stage3.forward(x);
        self.stage4.forward(x)
    }
}

/// VGG-16 feature extractor
///
/// Thirteen 3x3 convolutions in five blocks, each block followed by 2x2
/// max-pooling. The fully-connected top is excluded; the output is the
/// final feature map (512 channels, 1/32 of the input resolution).
#[derive(Module, Debug)]
pub struct Vgg16<B: Backend> {
    conv1_1: Conv2d<B>,
    conv1_2: Conv2d<B>,
    conv2_1: Conv2d<B>,
    conv2_2: Conv2d<B>,
    conv3_1: Conv2d<B>,
    conv3_2: Conv2d<B>,
    conv3_3: Conv2d<B>,
    conv4_1: Conv2d<B>,
    conv4_2: Conv2d<B>,
    conv4_3: Conv2d<B>,
    conv5_1: Conv2d<B>,
    conv5_2: Conv2d<B>,
    conv5_3: Conv2d<B>,
    pool: MaxPool2d,
    activation: Relu,
}

impl<B: Backend> Vgg16<B> {
    const OUT_CHANNELS: usize = 512;

    /// Create a new VGG-16 feature extractor
    pub fn new(device: &B::Device) -> Self {
        let conv = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };

        Self {
            conv1_1: conv([3, 64]),
            conv1_2: conv([64, 64]),
            conv2_1: conv([64, 128]),
            conv2_2: conv([128, 128]),
            conv3_1: conv([128, 256]),
            conv3_2: conv([256, 256]),
            conv3_3: conv([256, 256]),
            conv4_1: conv([256, 512]),
            conv4_2: conv([512, 512]),
            conv4_3: conv([512, 512]),
            conv5_1: conv([512, 512]),
            conv5_2: conv([512, 512]),
            conv5_3: conv([512, 512]),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            activation: Relu::new(),
        }
    }

    /// Forward pass, producing the final feature map
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.activation.forward(self.conv1_1.forward(input));
        let x = self.activation.forward(self.conv1_2.forward(x));
        let x = self.pool.forward(x);

        let x = self.activation.forward(self.conv2_1.forward(x));
        let x = self.activation.forward(self.conv2_2.forward(x));
        let x = self.pool.forward(x);

        let x = self.activation.forward(self.conv3_1.forward(x));
        let x = self.activation.forward(self.conv3_2.forward(x));
        let x = self.activation.forward(self.conv3_3.forward(x));
        let x = self.pool.forward(x);

        let x = self.activation.forward(self.conv4_1.forward(x));
        let x = self.activation.forward(self.conv4_2.forward(x));
        let x = self.activation.forward(self.conv4_3.forward(x));
        let x = self.pool.forward(x);

        let x = self.activation.forward(self.conv5_1.forward(x));
        let x = self.activation.forward(self.conv5_2.forward(x));
        let x = self.activation.forward(self.conv5_3.forward(x));
        self.pool.forward(x)
    }
}

/// MobileNet-V2 feature extractor
///
/// Stem conv followed by expand/project stages and a 1x1 head conv. The
/// classification top is excluded; the output is the final feature map
/// (1280 channels, 1/32 of the input resolution).
#[derive(Module, Debug)]
pub struct MobileNetV2<B: Backend> {
    stem: Conv2d<B>,
    stem_bn: BatchNorm<B, 2>,

    stage1_conv: Conv2d<B>,
    stage1_bn: BatchNorm<B, 2>,

    stage2_expand: Conv2d<B>,
    stage2_expand_bn: BatchNorm<B, 2>,
    stage2_project: Conv2d<B>,
    stage2_project_bn: BatchNorm<B, 2>,

    stage3_expand: Conv2d<B>,
    stage3_expand_bn: BatchNorm<B, 2>,
    stage3_project: Conv2d<B>,
    stage3_project_bn: BatchNorm<B, 2>,

    stage4_expand: Conv2d<B>,
    stage4_expand_bn: BatchNorm<B, 2>,
    stage4_project: Conv2d<B>,
    stage4_project_bn: BatchNorm<B, 2>,

    stage5_expand: Conv2d<B>,
    stage5_expand_bn: BatchNorm<B, 2>,
    stage5_project: Conv2d<B>,
    stage5_project_bn: BatchNorm<B, 2>,

    head: Conv2d<B>,
    head_bn: BatchNorm<B, 2>,

    activation: Relu,
}

impl<B: Backend> MobileNetV2<B> {
    const OUT_CHANNELS: usize = 1280;

    /// Create a new MobileNet-V2 feature extractor
    pub fn new(device: &B::Device) -> Self {
        let stem = Conv2dConfig::new([3, 32], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let stem_bn = BatchNormConfig::new(32).init(device);

        // Stage 1: 32 -> 16, no expansion, stride 1
        let stage1_conv = Conv2dConfig::new([32, 16], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let stage1_bn = BatchNormConfig::new(16).init(device);

        let expand = |channels: [usize; 2]| Conv2dConfig::new(channels, [1, 1]).init(device);
        let project = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };

        // Stages 2-5: expand by 6, project with stride 2
        let stage2_expand = expand([16, 96]);
        let stage2_expand_bn = BatchNormConfig::new(96).init(device);
        let stage2_project = project([96, 24]);
        let stage2_project_bn = BatchNormConfig::new(24).init(device);

        let stage3_expand = expand([24, 144]);
        let stage3_expand_bn = BatchNormConfig::new(144).init(device);
        let stage3_project = project([144, 32]);
        let stage3_project_bn = BatchNormConfig::new(32).init(device);

        let stage4_expand = expand([32, 192]);
        let stage4_expand_bn = BatchNormConfig::new(192).init(device);
        let stage4_project = project([192, 64]);
        let stage4_project_bn = BatchNormConfig::new(64).init(device);

        let stage5_expand = expand([64, 384]);
        let stage5_expand_bn = BatchNormConfig::new(384).init(device);
        let stage5_project = project([384, 96]);
        let stage5_project_bn = BatchNormConfig::new(96).init(device);

        let head = Conv2dConfig::new([96, 1280], [1, 1]).init(device);
        let head_bn = BatchNormConfig::new(1280).init(device);

        Self {
            stem,
            stem_bn,
            stage1_conv,
            stage1_bn,
            stage2_expand,
            stage2_expand_bn,
            stage2_project,
            stage2_project_bn,
            stage3_expand,
            stage3_expand_bn,
            stage3_project,
            stage3_project_bn,
            stage4_expand,
            stage4_expand_bn,
            stage4_project,
            stage4_project_bn,
            stage5_expand,
            stage5_expand_bn,
            stage5_project,
            stage5_project_bn,
            head,
            head_bn,
            activation: Relu::new(),
        }
    }

    /// Forward pass, producing the final feature map
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.stem.forward(input);
        let x = self.stem_bn.forward(x);
        let x = self.activation.forward(x);

        let x = self.stage1_conv.forward(x);
        let x = self.stage1_bn.forward(x);
        let x = self.activation.forward(x);

        let x = self.stage2_expand.forward(x);
        let x = self.stage2_expand_bn.forward(x);
        let x = self.activation.forward(x);
        let x = self.stage2_project.forward(x);
        let x = self.stage2_project_bn.forward(x);
        let x = self.activation.forward(x);

        let x = self.stage3_expand.forward(x);
        let x = self.stage3_expand_bn.forward(x);
        let x = self.activation.forward(x);
        let x = self.stage3_project.forward(x);
        let x = self.stage3_project_bn.forward(x);
        let x = self.activation.forward(x);

        let x = self.stage4_expand.forward(x);
        let x = self.stage4_expand_bn.forward(x);
        let x = self.activation.forward(x);
        let x = self.stage4_project.forward(x);
        let x = self.stage4_project_bn.forward(x);
        let x = self.activation.forward(x);

        let x = self.stage5_expand.forward(x);
        let x = self.stage5_expand_bn.forward(x);
        let x = self.activation.forward(x);
        let x = self.stage5_project.forward(x);
        let x = self.stage5_project_bn.forward(x);
        let x = self.activation.forward(x);

        let x = self.head.forward(x);
        let x = self.head_bn.forward(x);
        self.activation.forward(x)
    }
}

/// Backbone registry: one variant per registered architecture.
///
/// [`Backbone::build`] is the selector-to-constructor mapping; every
/// registered architecture has exactly one entry here.
#[derive(Module, Debug)]
pub enum Backbone<B: Backend> {
    ResNet50(ResNet50<B>),
    Vgg16(Vgg16<B>),
    MobileNetV2(MobileNetV2<B>),
}

impl<B: Backend> Backbone<B> {
    /// Instantiate the backbone registered for the given architecture
    pub fn build(kind: ArchitectureKind, device: &B::Device) -> Self {
        match kind {
            ArchitectureKind::ResNet50 => Backbone::ResNet50(ResNet50::new(device)),
            ArchitectureKind::Vgg16 => Backbone::Vgg16(Vgg16::new(device)),
            ArchitectureKind::MobileNetV2 => Backbone::MobileNetV2(MobileNetV2::new(device)),
        }
    }

    /// The architecture this backbone implements
    pub fn kind(&self) -> ArchitectureKind {
        match self {
            Backbone::ResNet50(_) => ArchitectureKind::ResNet50,
            Backbone::Vgg16(_) => ArchitectureKind::Vgg16,
            Backbone::MobileNetV2(_) => ArchitectureKind::MobileNetV2,
        }
    }

    /// Forward pass through the feature extractor
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Backbone::ResNet50(model) => model.forward(input),
            Backbone::Vgg16(model) => model.forward(input),
            Backbone::MobileNetV2(model) => model.forward(input),
        }
    }

    /// Channel count of the final feature map
    pub fn out_channels(&self) -> usize {
        match self {
            Backbone::ResNet50(_) => ResNet50::<B>::OUT_CHANNELS,
            Backbone::Vgg16(_) => Vgg16::<B>::OUT_CHANNELS,
            Backbone::MobileNetV2(_) => MobileNetV2::<B>::OUT_CHANNELS,
        }
    }

    /// Flattened width of the feature map for the given input shape.
    ///
    /// Mirrors the layer arithmetic of the forward pass: five stride-2
    /// reductions, rounding up for "same"-padded convolutions and down
    /// for VGG's 2x2 pooling.
    pub fn feature_dim(&self, shape: ImageShape) -> usize {
        let reduce: fn(u32) -> u32 = match self {
            Backbone::Vgg16(_) => half_down,
            _ => half_up,
        };

        let mut width = shape.width;
        let mut height = shape.height;
        for _ in 0..5 {
            width = reduce(width);
            height = reduce(height);
        }

        self.out_channels() * width as usize * height as usize
    }
}

/// Loads pre-trained backbone weights from a record file.
fn load_pretrained<B: Backend>(
    backbone: Backbone<B>,
    path: &Path,
    device: &B::Device,
) -> Result<Backbone<B>> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::default();
    let record = recorder.load(path.to_path_buf(), device).map_err(|e| {
        TrainerError::Model(format!(
            "Failed to load pretrained weights {}: {e}",
            path.display()
        ))
    })?;

    Ok(backbone.load_record(record))
}

/// Transfer-learning classifier: backbone, flatten, fully-connected head
#[derive(Module, Debug)]
pub struct TransferClassifier<B: Backend> {
    backbone: Backbone<B>,
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> TransferClassifier<B> {
    /// Forward pass producing class logits
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(input);

        // Flatten [batch, channels, h, w] -> [batch, channels * h * w]
        let [batch, channels, height, width] = features.dims();
        let mut x: Tensor<B, 2> = features.reshape([batch, channels * height * width]);

        for layer in self.hidden.iter() {
            x = self.activation.forward(layer.forward(x));
        }

        self.output.forward(x)
    }

    /// Forward pass with softmax-normalized class probabilities
    pub fn predict(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(input), 1)
    }

    pub fn backbone(&self) -> &Backbone<B> {
        &self.backbone
    }

    /// Widths of the hidden fully-connected layers, in order
    pub fn hidden_widths(&self) -> Vec<usize> {
        self.hidden
            .iter()
            .map(|layer| layer.weight.val().dims()[1])
            .collect()
    }

    /// Input width of the first fully-connected layer
    pub fn head_input_dim(&self) -> usize {
        self.hidden
            .first()
            .unwrap_or(&self.output)
            .weight
            .val()
            .dims()[0]
    }

    /// Width of the output layer
    pub fn output_width(&self) -> usize {
        self.output.weight.val().dims()[1]
    }
}

/// Optimizer selected at compile time, holding its framework config
pub enum OptimizerSetup {
    Sgd(SgdConfig),
    Adam(AdamConfig),
    AdamW(AdamWConfig),
    RmsProp(RmsPropConfig),
}

impl OptimizerSetup {
    fn for_kind(kind: OptimizerKind) -> Self {
        match kind {
            OptimizerKind::Sgd => OptimizerSetup::Sgd(SgdConfig::new()),
            OptimizerKind::Adam => OptimizerSetup::Adam(AdamConfig::new()),
            OptimizerKind::AdamW => OptimizerSetup::AdamW(AdamWConfig::new()),
            OptimizerKind::RmsProp => OptimizerSetup::RmsProp(RmsPropConfig::new()),
        }
    }

    /// The optimizer identifier this setup was built from
    pub fn kind(&self) -> OptimizerKind {
        match self {
            OptimizerSetup::Sgd(_) => OptimizerKind::Sgd,
            OptimizerSetup::Adam(_) => OptimizerKind::Adam,
            OptimizerSetup::AdamW(_) => OptimizerKind::AdamW,
            OptimizerSetup::RmsProp(_) => OptimizerKind::RmsProp,
        }
    }
}

/// Metric tracked during training
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Accuracy,
}

/// A compiled model: the assembled network plus optimizer, loss, and
/// tracked metrics
pub struct CompiledModel<B: Backend> {
    network: TransferClassifier<B>,
    optimizer: OptimizerSetup,
    loss: LossKind,
    learning_rate: f64,
    metrics: Vec<Metric>,
}

impl<B: Backend> CompiledModel<B> {
    pub fn network(&self) -> &TransferClassifier<B> {
        &self.network
    }

    pub fn into_network(self) -> TransferClassifier<B> {
        self.network
    }

    pub fn optimizer(&self) -> &OptimizerSetup {
        &self.optimizer
    }

    pub fn loss(&self) -> LossKind {
        self.loss
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Instantiate the configured loss function
    pub fn loss_fn(&self, device: &B::Device) -> CrossEntropyLoss<B> {
        match self.loss {
            LossKind::CrossEntropy => CrossEntropyLossConfig::new().init(device),
        }
    }
}

/// Assembles and compiles the transfer-learning classifier described by
/// the options.
///
/// The backbone is looked up in the architecture registry and optionally
/// loaded with pre-trained weights, then wrapped with a flatten step,
/// `num_fc_layers` fully-connected layers of width `fc_neurones`, and a
/// final output layer of width `output_classes`.
pub fn build_model<B: Backend>(
    opts: &TrainingOptions,
    device: &B::Device,
) -> Result<CompiledModel<B>> {
    let mut backbone = Backbone::build(opts.architecture, device);
    if let Some(path) = &opts.pretrained {
        backbone = load_pretrained(backbone, path, device)?;
    }

    let feature_dim = backbone.feature_dim(opts.image_shape);

    let mut hidden = Vec::with_capacity(opts.num_fc_layers);
    let mut in_features = feature_dim;
    for _ in 0..opts.num_fc_layers {
        hidden.push(LinearConfig::new(in_features, opts.fc_neurones).init(device));
        in_features = opts.fc_neurones;
    }

    let output = LinearConfig::new(in_features, opts.output_classes).init(device);

    let network = TransferClassifier {
        backbone,
        hidden,
        output,
        activation: Relu::new(),
    };

    Ok(CompiledModel {
        network,
        optimizer: OptimizerSetup::for_kind(opts.optimiser),
        loss: opts.loss_function,
        learning_rate: opts.learning_rate,
        metrics: vec![Metric::Accuracy],
    })
}
