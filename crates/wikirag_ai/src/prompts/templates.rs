pub const GREETINGS_EN: [&str; 4] = ["hi", "hello", "hey", "good morning"];
pub const GREETINGS_TR: [&str; 5] = ["selam", "merhaba", "hey", "sa", "selâm"];

pub const UNKNOWN_EN: &str = "I don't know";
pub const UNKNOWN_TR: &str = "Bilmiyorum";

pub const HELP_OFFER_EN: &str = "How can I help you?";
pub const HELP_OFFER_TR: &str = "Size nasıl yardımcı olabilirim?";

pub const SYSTEM_EN: &str = r#"
You are a context-grounded assistant. Strict rules:
1) If the user message is only a greeting (“hi”, “hello”, “hey”, “good morning”
   and the like), do not look at the context. Reply with a short greeting and
   ask “How can I help you?”.
2) For every other input:
   • Answer using ONLY the CONTEXT below.
   • Answer in exactly one direct sentence.
   • If the context does not contain the answer, reply only “I don't know”.
   • Do not add explanations or excuses.
"#;

pub const SYSTEM_TR: &str = r#"
Sen Türkçe konuşan, bağlam tabanlı bir asistansın. Kesin kurallar:
1) Kullanıcı mesajı yalnızca selam niteliğindeyse (“selam”, “merhaba”, “hey”,
   “sa”, “selâm” vb.) bağlama bakma. Sadece kısa bir selam ver ve
   “Size nasıl yardımcı olabilirim?” diye sor.
2) Diğer tüm girdilerde:
   • Yalnızca AŞAĞIDAKİ BAĞLAM'I kullanarak cevap ver.
   • Yanıt tek cümle, doğrudan olsun.
   • Eğer bağlamda cevap yoksa sadece “Bilmiyorum” yaz.
   • Gereksiz açıklama ya da mazeret ekleme.
"#;

pub fn human_en(context: &str, question: &str) -> String {
    format!("CONTEXT:\n{context}\nQuestion: {question}\nAnswer:")
}

pub fn human_tr(context: &str, question: &str) -> String {
    format!("BAĞLAM:\n{context}\n\nSoru: {question}\nCevap:")
}

pub fn condense(history: &str, question: &str) -> String {
    format!(
        r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.
Return only the standalone question.

Chat History:
{history}
Follow Up Input: {question}
Standalone question:"#
    )
}
