use std::fmt;
use std::str::FromStr;

/// Sentence the binary-decision variant must emit when the documents do not
/// answer the question.
pub const NOT_FOUND_SENTENCE: &str = "Não encontrei essa informação nos documentos.";

/// Which rule set the system instruction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptVariant {
    /// Copy the matching strategies as a bulleted list.
    #[default]
    Verbatim,
    /// Copy and stop, or emit exactly [`NOT_FOUND_SENTENCE`].
    Binary,
    /// JSON object `{"encontrou": bool, "lista_acoes": [...]}` only.
    Structured,
}

impl PromptVariant {
    pub fn json_output(&self) -> bool {
        matches!(self, PromptVariant::Structured)
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptVariant::Verbatim => "verbatim",
            PromptVariant::Binary => "binary",
            PromptVariant::Structured => "structured",
        };
        f.write_str(name)
    }
}

impl FromStr for PromptVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verbatim" => Ok(PromptVariant::Verbatim),
            "binary" => Ok(PromptVariant::Binary),
            "structured" | "json" => Ok(PromptVariant::Structured),
            other => Err(format!(
                "unknown prompt variant '{}' (expected verbatim, binary or structured)",
                other
            )),
        }
    }
}

const HEADER: &str = "VOCÊ É UM ANALISTA TÉCNICO DE DOCUMENTOS ESCOLARES.";

const VERBATIM_RULES: &str = r#"REGRAS RÍGIDAS:
1. Identifique o arquivo correto (ex: se a pergunta é TDAH, use o texto do TDAH).
2. COPIE as estratégias do texto. Não parafraseie se não precisar.
3. Formate como lista (bullets).
4. NÃO invente.
5. Seja direto. Sem "Olá" ou "Espero ter ajudado"."#;

const STRUCTURED_RULES: &str = r#"REGRAS RÍGIDAS:
1. Identifique o arquivo correto (ex: se a pergunta é TDAH, use o texto do TDAH).
2. COPIE as ações exatamente como estão no texto. NÃO parafraseie.
3. NÃO invente ações que não estejam na Base de Dados.
4. Responda SOMENTE com um objeto JSON, sem texto antes ou depois, sem blocos de código.
5. O objeto deve seguir exatamente este formato:
{"encontrou": true, "lista_acoes": ["ação 1", "ação 2"]}
6. Se a resposta NÃO existir na Base de Dados, responda exatamente:
{"encontrou": false, "lista_acoes": []}"#;

/// Build the system instruction for one chat turn.
///
/// The whole knowledge base goes in verbatim; nothing narrows it first, so the
/// model's context window bounds how many documents are usable.
pub fn compose(variant: PromptVariant, knowledge_base: &str, question: &str) -> String {
    let rules = match variant {
        PromptVariant::Verbatim => VERBATIM_RULES.to_string(),
        PromptVariant::Binary => binary_rules(),
        PromptVariant::Structured => STRUCTURED_RULES.to_string(),
    };

    format!(
        "{header}\n\n\
         === SUA BASE DE DADOS (LEIA TUDO) ===\n\
         {kb}\n\
         =====================================\n\n\
         SUA TAREFA:\n\
         Responder à pergunta \"{question}\" usando ESTRITAMENTE o conteúdo da Base de Dados acima.\n\n\
         {rules}\n",
        header = HEADER,
        kb = knowledge_base,
        question = question,
        rules = rules,
    )
}

fn binary_rules() -> String {
    format!(
        "{}\n\n\
         DECISÃO OBRIGATÓRIA:\n\
         A) Se a resposta EXISTE na Base de Dados: copie a lista e PARE imediatamente após o último item. \
         Nenhum comentário, resumo ou conclusão depois da lista.\n\
         B) Se a resposta NÃO EXISTE na Base de Dados: escreva apenas a frase \"{}\" e PARE.",
        VERBATIM_RULES, NOT_FOUND_SENTENCE
    )
}

/// Fixed instruction for the arithmetic tutor.
pub const TUTOR_SYSTEM_PROMPT: &str = r#"### PERFIL ###
Você é um Tutor de Matemática Especializado em Discalculia.
Sua missão é resolver contas usando EXCLUSIVAMENTE o "Método da Decomposição".
NUNCA use o método da chave tradicional, nem "empresta um" ou "vai um".

### O MÉTODO (PASSO A PASSO) ###
1. DECOMPOR: Separe o número falando em voz alta ("Eu tenho 600, tenho 30...").
2. OPERAR: Faça a conta com cada pedaço separadamente.
3. JUNTAR: Some os resultados parciais.
4. MOSTRAR RESULTADO: Em destaque, numa linha própria começando com "**Resultado:**".

### REGRAS VISUAIS ###
- Use listas com marcadores (•) para organizar.
- Use negrito para números importantes.
- Seja muito didático e paciente.
- Se for divisão, explique como se estivesse dividindo dinheiro ou objetos."#;

pub fn tutor_user_message(expression: &str) -> String {
    format!("Resolva: {}", expression.trim())
}
